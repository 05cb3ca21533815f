//! @ai:module:intent Aggregate per-benchmark verification and ranking records into totals
//! @ai:module:layer application
//! @ai:module:public_api MetricsAggregator
//! @ai:module:stateless true

use crate::metrics::types::{
    BenchmarkRanking, BenchmarkReport, MatchCounts, RankingResults, TaskStats, VerdictCounts,
    VerificationResults, WinStats,
};
use crate::spec::MatchKind;
use crate::verification::{Verdict, VerificationTask};
use std::collections::BTreeMap;

/// @ai:intent Trait for metrics aggregation
pub trait MetricsAggregatorTrait: Send + Sync {
    /// @ai:intent Aggregate benchmark reports into verification results
    fn aggregate_verification(
        &self,
        benchmarks: Vec<BenchmarkReport>,
        result_info_file: &str,
        allow_invalid_klee_dir: bool,
    ) -> VerificationResults;

    /// @ai:intent Tally wins and ties over per-benchmark rankings
    fn aggregate_ranking(&self, benchmarks: Vec<BenchmarkRanking>, files: &[String]) -> RankingResults;
}

/// @ai:intent Aggregates benchmark records into statistical summaries
pub struct MetricsAggregator;

impl MetricsAggregator {
    /// @ai:intent Create a new metrics aggregator
    /// @ai:effects pure
    pub fn new() -> Self {
        Self
    }

    /// @ai:intent Totals for one task over every benchmark that reported it
    /// @ai:effects pure
    fn task_stats(task: VerificationTask, benchmarks: &[BenchmarkReport]) -> TaskStats {
        let mut verdicts = VerdictCounts::default();
        let mut matches = MatchCounts::default();

        for report in benchmarks
            .iter()
            .flat_map(|b| b.tasks.iter())
            .filter(|t| t.task == task)
        {
            match report.verdict {
                Verdict::Correct => verdicts.correct += 1,
                Verdict::Incorrect => verdicts.incorrect += 1,
                Verdict::Unknown => verdicts.unknown += 1,
            }
            match report.spec_match {
                Some(MatchKind::Match) => matches.matched += 1,
                Some(MatchKind::Mismatch) => matches.mismatched += 1,
                Some(MatchKind::Unknown) | None => matches.unknown += 1,
            }
            if report.false_positive {
                matches.false_positives += 1;
            }
            if report.true_positive {
                matches.true_positives += 1;
            }
        }

        TaskStats {
            task,
            verdicts,
            matches,
        }
    }
}

impl Default for MetricsAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsAggregatorTrait for MetricsAggregator {
    /// @ai:intent Aggregate benchmark reports into verification results
    /// @ai:effects pure
    fn aggregate_verification(
        &self,
        benchmarks: Vec<BenchmarkReport>,
        result_info_file: &str,
        allow_invalid_klee_dir: bool,
    ) -> VerificationResults {
        let by_task = VerificationTask::ALL
            .into_iter()
            .map(|task| Self::task_stats(task, &benchmarks))
            .filter(|stats| stats.verdicts != VerdictCounts::default())
            .collect();

        let mut overall = VerdictCounts::default();
        for benchmark in &benchmarks {
            match benchmark.overall {
                Verdict::Correct => overall.correct += 1,
                Verdict::Incorrect => overall.incorrect += 1,
                Verdict::Unknown => overall.unknown += 1,
            }
        }

        VerificationResults {
            timestamp: chrono::Utc::now().to_rfc3339(),
            result_info_file: result_info_file.to_string(),
            allow_invalid_klee_dir,
            benchmarks,
            by_task,
            overall,
            skipped: Vec::new(),
        }
    }

    /// @ai:intent Tally wins and ties over per-benchmark rankings
    /// @ai:effects pure
    fn aggregate_ranking(&self, benchmarks: Vec<BenchmarkRanking>, files: &[String]) -> RankingResults {
        let mut wins: Vec<WinStats> = files
            .iter()
            .map(|name| WinStats {
                name: name.clone(),
                ..WinStats::default()
            })
            .collect();
        let mut ties = 0;
        let mut tie_reasons: BTreeMap<String, usize> = BTreeMap::new();

        for ranking in &benchmarks {
            let Some(first) = ranking.positions.first() else {
                continue;
            };
            let kind = first.reason.kind().to_string();
            match first.indices.as_slice() {
                [winner] if *winner < wins.len() => {
                    let stats = &mut wins[*winner];
                    stats.wins += 1;
                    *stats.reasons.entry(kind).or_default() += 1;
                }
                _ => {
                    ties += 1;
                    *tie_reasons.entry(kind).or_default() += 1;
                }
            }
        }

        RankingResults {
            timestamp: chrono::Utc::now().to_rfc3339(),
            files: files.to_vec(),
            benchmarks,
            wins,
            ties,
            tie_reasons,
            skipped: Vec::new(),
        }
    }
}
