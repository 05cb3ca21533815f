//! @ai:module:intent Owned report records for verification and ranking runs
//! @ai:module:layer domain
//! @ai:module:public_api TaskReport, BenchmarkReport, VerdictCounts, MatchCounts, TaskStats, VerificationResults, BenchmarkRanking, WinStats, RankingResults
//! @ai:module:stateless true

use crate::rank::RankPosition;
use crate::result_info::RunOutcome;
use crate::spec::{MatchKind, SpecMatch};
use crate::verification::{Verdict, VerificationResult, VerificationTask};
use serde::Serialize;
use std::collections::BTreeMap;

/// @ai:intent Verdict and spec comparison for one task of one benchmark
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskReport {
    pub task: VerificationTask,
    pub verdict: Verdict,
    pub unknown_reason: Option<String>,
    /// Identifiers of the test cases backing the verdict
    pub test_cases: Vec<u32>,
    /// `None` when no spec entry was available
    pub spec_match: Option<MatchKind>,
    pub match_detail: Option<String>,
    pub false_positive: bool,
    pub true_positive: bool,
    pub warnings: Vec<String>,
}

impl TaskReport {
    /// @ai:intent Flatten a borrowed verdict (and its spec match) into an owned record
    /// @ai:effects pure
    pub fn new(result: &VerificationResult<'_>, spec_match: Option<&SpecMatch<'_>>) -> Self {
        let unknown_reason = match result {
            VerificationResult::Unknown { reason, .. } => Some(reason.to_string()),
            _ => None,
        };

        let (match_detail, false_positive, true_positive, warnings) = match spec_match {
            Some(SpecMatch::Match {
                expect_correct,
                warnings,
                ..
            }) => (
                None,
                false,
                !*expect_correct,
                warnings.iter().map(|w| w.to_string()).collect(),
            ),
            Some(SpecMatch::Mismatch { reason, .. }) => {
                (Some(reason.to_string()), reason.is_false_positive(), false, Vec::new())
            }
            Some(SpecMatch::UnknownMatch { reason, .. }) => {
                (Some(reason.to_string()), false, false, Vec::new())
            }
            None => (None, false, false, Vec::new()),
        };

        Self {
            task: result.task(),
            verdict: result.verdict(),
            unknown_reason,
            test_cases: result.test_cases().iter().map(|t| t.identifier).collect(),
            spec_match: spec_match.map(SpecMatch::kind),
            match_detail,
            false_positive,
            true_positive,
            warnings,
        }
    }
}

/// @ai:intent Everything learned about one benchmark's run(s)
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkReport {
    pub program: String,
    pub spec_name: Option<String>,
    pub klee_dirs: Vec<String>,
    pub outcomes: Vec<RunOutcome>,
    pub overall: Verdict,
    pub tasks: Vec<TaskReport>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerdictCounts {
    pub correct: usize,
    pub incorrect: usize,
    pub unknown: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchCounts {
    pub matched: usize,
    pub mismatched: usize,
    pub unknown: usize,
    pub false_positives: usize,
    pub true_positives: usize,
}

/// @ai:intent Totals for one verification task across all benchmarks
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskStats {
    pub task: VerificationTask,
    pub verdicts: VerdictCounts,
    pub matches: MatchCounts,
}

/// @ai:intent Complete output of a verification run
#[derive(Debug, Clone, Serialize)]
pub struct VerificationResults {
    pub timestamp: String,
    pub result_info_file: String,
    pub allow_invalid_klee_dir: bool,
    pub benchmarks: Vec<BenchmarkReport>,
    pub by_task: Vec<TaskStats>,
    /// Per-benchmark verdicts summarized across tasks
    pub overall: VerdictCounts,
    /// Programs left out by the category filter
    pub skipped: Vec<String>,
}

/// @ai:intent Ranking of one benchmark across the compared files
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkRanking {
    pub program: String,
    pub positions: Vec<RankPosition>,
}

/// @ai:intent How often one compared file ranked first alone
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WinStats {
    pub name: String,
    pub wins: usize,
    /// Reason kind -> count
    pub reasons: BTreeMap<String, usize>,
}

/// @ai:intent Complete output of a ranking run
#[derive(Debug, Clone, Serialize)]
pub struct RankingResults {
    pub timestamp: String,
    pub files: Vec<String>,
    pub benchmarks: Vec<BenchmarkRanking>,
    pub wins: Vec<WinStats>,
    pub ties: usize,
    pub tie_reasons: BTreeMap<String, usize>,
    pub skipped: Vec<String>,
}
