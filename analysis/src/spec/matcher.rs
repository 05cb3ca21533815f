//! @ai:module:intent Compare a classification result with the benchmark's specification
//! @ai:module:layer application
//! @ai:module:public_api SpecMatch, MismatchReason, UnknownMatchReason, MatchWarning, match_against_spec, observed_file_matches
//! @ai:module:depends_on spec::model, verification
//! @ai:module:stateless true

use crate::spec::model::TaskSpec;
use crate::verification::{VerificationResult, VerificationTask};
use kleedir::TestCase;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchReason {
    ExpectCorrectButIncorrect,
    ExpectIncorrectButCorrect,
    DisallowedCounterExample,
}

impl MismatchReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            MismatchReason::ExpectCorrectButIncorrect => {
                "expect correct but KLEE reports incorrect"
            }
            MismatchReason::ExpectIncorrectButCorrect => {
                "expect incorrect but KLEE reports correct"
            }
            MismatchReason::DisallowedCounterExample => {
                "expected incorrect and KLEE reported this but observed disallowed counter example(s)"
            }
        }
    }

    /// @ai:intent True if the tool claimed a bug the spec does not allow
    /// @ai:effects pure
    pub fn is_false_positive(&self) -> bool {
        matches!(
            self,
            MismatchReason::ExpectCorrectButIncorrect | MismatchReason::DisallowedCounterExample
        )
    }
}

impl std::fmt::Display for MismatchReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownMatchReason {
    SpecProvidesNoCorrectness,
    ToolCouldNotDetermineCorrectness,
}

impl UnknownMatchReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnknownMatchReason::SpecProvidesNoCorrectness => "spec provides no correctness",
            UnknownMatchReason::ToolCouldNotDetermineCorrectness => {
                "KLEE could not determine correctness"
            }
        }
    }
}

impl std::fmt::Display for UnknownMatchReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// @ai:intent Non-fatal observations attached to a match
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchWarning {
    /// Spec locations that no observed counter example hit
    NotAllObserved {
        unobserved: BTreeMap<String, BTreeSet<u64>>,
    },
    /// Observed counter examples (by test identifier) the spec does not list
    CounterExamplesNotInSpec { identifiers: Vec<u32> },
}

impl std::fmt::Display for MatchWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchWarning::NotAllObserved { unobserved } => {
                let locations: Vec<String> = unobserved
                    .iter()
                    .flat_map(|(file, lines)| lines.iter().map(move |l| format!("{file}:{l}")))
                    .collect();
                write!(
                    f,
                    "Observed counter examples do not cover all listed in spec ({})",
                    locations.join(", ")
                )
            }
            MatchWarning::CounterExamplesNotInSpec { identifiers } => {
                write!(
                    f,
                    "Observed {} counter example(s) not listed in spec",
                    identifiers.len()
                )
            }
        }
    }
}

/// @ai:intent Which way a spec match went, without its justification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Match,
    Mismatch,
    Unknown,
}

impl MatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchKind::Match => "match",
            MatchKind::Mismatch => "mismatch",
            MatchKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for MatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// @ai:intent Outcome of matching one task's classification against its spec
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SpecMatch<'a> {
    Match {
        task: VerificationTask,
        expect_correct: bool,
        test_cases: Vec<&'a TestCase>,
        warnings: Vec<MatchWarning>,
    },
    Mismatch {
        task: VerificationTask,
        reason: MismatchReason,
        test_cases: Vec<&'a TestCase>,
        expect_correct: bool,
    },
    UnknownMatch {
        task: VerificationTask,
        reason: UnknownMatchReason,
        expect_correct: Option<bool>,
    },
}

impl SpecMatch<'_> {
    pub fn task(&self) -> VerificationTask {
        match self {
            SpecMatch::Match { task, .. }
            | SpecMatch::Mismatch { task, .. }
            | SpecMatch::UnknownMatch { task, .. } => *task,
        }
    }

    pub fn kind(&self) -> MatchKind {
        match self {
            SpecMatch::Match { .. } => MatchKind::Match,
            SpecMatch::Mismatch { .. } => MatchKind::Mismatch,
            SpecMatch::UnknownMatch { .. } => MatchKind::Unknown,
        }
    }
}

/// @ai:intent Decide whether an absolute observed path refers to a relative spec file
/// @ai:effects pure
///
/// Suffix heuristic: `observed` matches when it equals `spec_file` or ends
/// with `/<spec_file>`. Two spec files sharing a trailing path under
/// different roots are indistinguishable, so this can match the wrong file.
pub fn observed_file_matches(observed: &str, spec_file: &str) -> bool {
    if observed == spec_file {
        return true;
    }
    observed
        .strip_suffix(spec_file)
        .is_some_and(|prefix| prefix.ends_with('/'))
}

/// @ai:intent Match a classification result against the spec entry for its task
/// @ai:pre `spec` is the entry for `result.task()`
/// @ai:effects pure
pub fn match_against_spec<'a>(result: &VerificationResult<'a>, spec: &TaskSpec) -> SpecMatch<'a> {
    let task = result.task();

    let Some(expect_correct) = spec.correct else {
        return SpecMatch::UnknownMatch {
            task,
            reason: UnknownMatchReason::SpecProvidesNoCorrectness,
            expect_correct: None,
        };
    };

    let counter_examples = match result {
        VerificationResult::Unknown { .. } => {
            return SpecMatch::UnknownMatch {
                task,
                reason: UnknownMatchReason::ToolCouldNotDetermineCorrectness,
                expect_correct: Some(expect_correct),
            };
        }
        VerificationResult::Correct { test_cases, .. } => {
            return if expect_correct {
                SpecMatch::Match {
                    task,
                    expect_correct,
                    test_cases: test_cases.clone(),
                    warnings: Vec::new(),
                }
            } else {
                SpecMatch::Mismatch {
                    task,
                    reason: MismatchReason::ExpectIncorrectButCorrect,
                    test_cases: test_cases.clone(),
                    expect_correct,
                }
            };
        }
        VerificationResult::Incorrect { test_cases, .. } => test_cases,
    };

    if expect_correct {
        return SpecMatch::Mismatch {
            task,
            reason: MismatchReason::ExpectCorrectButIncorrect,
            test_cases: counter_examples.clone(),
            expect_correct,
        };
    }

    let allowed = spec.allowed_locations();
    tracing::debug!("Allowed failures for task {}: {:?}", task, allowed);

    let mut expected = Vec::new();
    let mut unexpected = Vec::new();
    let mut unobserved = allowed.clone();

    for &test_case in counter_examples {
        let Some((_, report)) = test_case.error() else {
            unexpected.push(test_case);
            continue;
        };
        // several spec files may share the observed path's suffix
        let candidates: Vec<&String> = allowed
            .keys()
            .filter(|file| observed_file_matches(&report.file, file))
            .collect();
        let spec_file = candidates
            .iter()
            .find(|file| allowed[**file].contains(&report.line));

        match (spec_file, candidates.is_empty()) {
            (Some(file), _) => {
                tracing::debug!("{}:{} is an allowed failure", report.file, report.line);
                expected.push(test_case);
                if let Some(lines) = unobserved.get_mut(*file) {
                    lines.remove(&report.line);
                    if lines.is_empty() {
                        unobserved.remove(*file);
                    }
                }
            }
            (None, false) => {
                tracing::debug!(
                    "\"{}\" is an allowed file but line {} is not expected",
                    report.file,
                    report.line
                );
                unexpected.push(test_case);
            }
            (None, true) => {
                tracing::debug!("\"{}\" is not an allowed file", report.file);
                unexpected.push(test_case);
            }
        }
    }

    if unexpected.is_empty() {
        let mut warnings = Vec::new();
        if !unobserved.is_empty() {
            warnings.push(MatchWarning::NotAllObserved { unobserved });
        }
        return SpecMatch::Match {
            task,
            expect_correct,
            test_cases: expected,
            warnings,
        };
    }

    if spec.exhaustive_counter_examples {
        return SpecMatch::Mismatch {
            task,
            reason: MismatchReason::DisallowedCounterExample,
            test_cases: unexpected,
            expect_correct,
        };
    }

    let identifiers = unexpected.iter().map(|t| t.identifier).collect();
    expected.extend(unexpected);
    SpecMatch::Match {
        task,
        expect_correct,
        test_cases: expected,
        warnings: vec![MatchWarning::CounterExamplesNotInSpec { identifiers }],
    }
}
