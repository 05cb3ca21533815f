//! @ai:module:intent Decide per verification task whether a KLEE run proves, refutes or leaves it open
//! @ai:module:layer application
//! @ai:module:public_api VerificationResult, UnknownReason, classify, classify_all, summarize_across_tasks
//! @ai:module:depends_on verification::task
//! @ai:module:stateless true

use crate::error::{Error, Result};
use crate::verification::task::VerificationTask;
use kleedir::{RunDirectory, TestCase};
use serde::Serialize;

/// @ai:intent Why a task could be neither proven nor refuted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownReason {
    InvalidKleeDir,
    NoTestCases,
    EarlyTermination,
    CounterExampleBlocksTask,
}

impl UnknownReason {
    /// @ai:intent Human-readable explanation
    /// @ai:effects pure
    pub fn as_str(&self) -> &'static str {
        match self {
            UnknownReason::InvalidKleeDir => "klee_dir is invalid",
            UnknownReason::NoTestCases => "KLEE produced no test cases",
            UnknownReason::EarlyTermination => {
                "Cannot verify because KLEE terminated early on paths"
            }
            UnknownReason::CounterExampleBlocksTask => {
                "Cannot verify because KLEE terminated with other counter examples \
                 that block further checking of the task"
            }
        }
    }
}

impl std::fmt::Display for UnknownReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// @ai:intent Verdict for one task, borrowing the test cases that justify it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum VerificationResult<'a> {
    Correct {
        task: VerificationTask,
        test_cases: Vec<&'a TestCase>,
    },
    Incorrect {
        task: VerificationTask,
        test_cases: Vec<&'a TestCase>,
    },
    Unknown {
        task: VerificationTask,
        reason: UnknownReason,
        test_cases: Vec<&'a TestCase>,
    },
}

impl<'a> VerificationResult<'a> {
    pub fn task(&self) -> VerificationTask {
        match self {
            VerificationResult::Correct { task, .. }
            | VerificationResult::Incorrect { task, .. }
            | VerificationResult::Unknown { task, .. } => *task,
        }
    }

    pub fn test_cases(&self) -> &[&'a TestCase] {
        match self {
            VerificationResult::Correct { test_cases, .. }
            | VerificationResult::Incorrect { test_cases, .. }
            | VerificationResult::Unknown { test_cases, .. } => test_cases,
        }
    }

    /// @ai:intent The verdict without its justification
    pub fn verdict(&self) -> Verdict {
        match self {
            VerificationResult::Correct { .. } => Verdict::Correct,
            VerificationResult::Incorrect { .. } => Verdict::Incorrect,
            VerificationResult::Unknown { .. } => Verdict::Unknown,
        }
    }
}

/// @ai:intent Classify `dir` with respect to `task`
/// @ai:pre dir was produced with every undefined-behaviour check KLEE offers enabled
/// @ai:post Incorrect iff a counter example for `task` exists (and the directory may be inspected)
/// @ai:effects pure
///
/// Proving correctness needs exhaustive exploration: no early terminations,
/// and no error of another task that could have stopped a path before a
/// violation of `task` deeper in the program. Assertion failures and aborts
/// end execution, so they never block; every other error category does.
///
/// This reasoning only holds if KLEE was told to check for every kind of
/// undefined behaviour it can detect (overshift, division by zero, ...). If
/// those checks were disabled a `Correct` verdict cannot be trusted.
pub fn classify<'a, D: RunDirectory + ?Sized>(
    task: VerificationTask,
    dir: &'a D,
    allow_invalid_klee_dir: bool,
) -> VerificationResult<'a> {
    let unknown = |reason, test_cases| VerificationResult::Unknown {
        task,
        reason,
        test_cases,
    };

    if !dir.is_valid() && !allow_invalid_klee_dir {
        return unknown(UnknownReason::InvalidKleeDir, Vec::new());
    }

    if dir.tests().is_empty() {
        return unknown(UnknownReason::NoTestCases, Vec::new());
    }

    let counter_examples = task.counter_examples(dir);
    if !counter_examples.is_empty() {
        return VerificationResult::Incorrect {
            task,
            test_cases: counter_examples,
        };
    }

    if !dir.is_valid() {
        return unknown(UnknownReason::InvalidKleeDir, Vec::new());
    }

    let early_terminations = dir.early_terminations();
    if !early_terminations.is_empty() {
        return unknown(UnknownReason::EarlyTermination, early_terminations);
    }

    // Any error left belongs to a different task
    let (terminating, non_terminating): (Vec<&TestCase>, Vec<&TestCase>) = dir
        .errors()
        .into_iter()
        .partition(|t| t.category().is_some_and(|c| c.is_terminating()));

    if !non_terminating.is_empty() {
        tracing::debug!(
            "{} blocked by {} non-terminating counter examples",
            task,
            non_terminating.len()
        );
        return unknown(UnknownReason::CounterExampleBlocksTask, non_terminating);
    }

    // Terminating errors of other tasks are completed paths, relevant for coverage
    let mut relevant = dir.successful_terminations();
    relevant.extend(terminating);
    VerificationResult::Correct {
        task,
        test_cases: relevant,
    }
}

/// @ai:intent Classify `dir` for every verification task, in task order
/// @ai:effects pure
pub fn classify_all<D: RunDirectory + ?Sized>(
    dir: &D,
    allow_invalid_klee_dir: bool,
) -> Vec<VerificationResult<'_>> {
    VerificationTask::ALL
        .into_iter()
        .map(|task| classify(task, dir, allow_invalid_klee_dir))
        .collect()
}

/// @ai:intent Verdict of one task, or of one benchmark over all tasks, as a label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Correct,
    Incorrect,
    Unknown,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Correct => "correct",
            Verdict::Incorrect => "incorrect",
            Verdict::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// @ai:intent Summarize per-task results: correct iff all correct, incorrect if any incorrect
/// @ai:pre results is non-empty
/// @ai:effects pure
pub fn summarize_across_tasks(results: &[VerificationResult<'_>]) -> Result<Verdict> {
    if results.is_empty() {
        return Err(Error::EmptySummary);
    }
    if results
        .iter()
        .all(|r| matches!(r, VerificationResult::Correct { .. }))
    {
        return Ok(Verdict::Correct);
    }
    if results
        .iter()
        .any(|r| matches!(r, VerificationResult::Incorrect { .. }))
    {
        return Ok(Verdict::Incorrect);
    }
    Ok(Verdict::Unknown)
}
