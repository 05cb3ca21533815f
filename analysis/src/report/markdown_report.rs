//! @ai:module:intent Markdown report generation
//! @ai:module:layer infrastructure
//! @ai:module:public_api MarkdownReporter
//! @ai:module:stateless true

use crate::metrics::{BenchmarkReport, RankingResults, VerificationResults};
use crate::spec::MatchKind;
use anyhow::Result;
use std::fmt::Write as FmtWrite;
use std::path::Path;

/// @ai:intent Trait for Markdown report generation
pub trait MarkdownReporterTrait: Send + Sync {
    /// @ai:intent Generate Markdown report from verification results
    fn generate_verification(&self, results: &VerificationResults, output_path: &Path) -> Result<()>;

    /// @ai:intent Generate Markdown report from ranking results
    fn generate_ranking(&self, results: &RankingResults, output_path: &Path) -> Result<()>;
}

/// @ai:intent Generates Markdown reports from analysis results
pub struct MarkdownReporter;

impl MarkdownReporter {
    /// @ai:intent Create a new Markdown reporter
    /// @ai:effects pure
    pub fn new() -> Self {
        Self
    }

    /// @ai:intent Format a share of a total as a percentage
    /// @ai:effects pure
    fn format_share(count: usize, total: usize) -> String {
        if total == 0 {
            "-".to_string()
        } else {
            format!("{:.1}%", count as f64 * 100.0 / total as f64)
        }
    }

    /// @ai:effects pure
    fn verification_summary(results: &VerificationResults) -> String {
        let mut output = String::new();
        let total = results.benchmarks.len();

        writeln!(output, "# KLEE Verification Results").unwrap();
        writeln!(output).unwrap();
        writeln!(output, "**Date:** {}", results.timestamp).unwrap();
        writeln!(output, "**Result info:** {}", results.result_info_file).unwrap();
        writeln!(
            output,
            "**Invalid KLEE directories allowed:** {}",
            results.allow_invalid_klee_dir
        )
        .unwrap();
        writeln!(output).unwrap();

        writeln!(output, "## Overall").unwrap();
        writeln!(output).unwrap();
        writeln!(output, "| Verdict | Benchmarks | Share |").unwrap();
        writeln!(output, "|---------|------------|-------|").unwrap();
        for (label, count) in [
            ("correct", results.overall.correct),
            ("incorrect", results.overall.incorrect),
            ("unknown", results.overall.unknown),
        ] {
            writeln!(
                output,
                "| {} | {} | {} |",
                label,
                count,
                Self::format_share(count, total)
            )
            .unwrap();
        }
        writeln!(output).unwrap();

        output
    }

    /// @ai:effects pure
    fn task_section(results: &VerificationResults) -> String {
        let mut output = String::new();

        writeln!(output, "## Results by Task").unwrap();
        writeln!(output).unwrap();
        writeln!(
            output,
            "| Task | Correct | Incorrect | Unknown | Match | Mismatch | False Positives | True Positives |"
        )
        .unwrap();
        writeln!(
            output,
            "|------|---------|-----------|---------|-------|----------|-----------------|----------------|"
        )
        .unwrap();

        for stats in &results.by_task {
            writeln!(
                output,
                "| {} | {} | {} | {} | {} | {} | {} | {} |",
                stats.task,
                stats.verdicts.correct,
                stats.verdicts.incorrect,
                stats.verdicts.unknown,
                stats.matches.matched,
                stats.matches.mismatched,
                stats.matches.false_positives,
                stats.matches.true_positives
            )
            .unwrap();
        }

        writeln!(output).unwrap();
        output
    }

    /// @ai:intent List every task that did not match its expectation
    /// @ai:effects pure
    fn mismatch_section(benchmarks: &[BenchmarkReport]) -> String {
        let mut output = String::new();
        let mismatches: Vec<_> = benchmarks
            .iter()
            .flat_map(|b| b.tasks.iter().map(move |t| (b, t)))
            .filter(|(_, t)| t.spec_match == Some(MatchKind::Mismatch))
            .collect();

        if mismatches.is_empty() {
            return output;
        }

        writeln!(output, "## Mismatches").unwrap();
        writeln!(output).unwrap();
        writeln!(output, "| Program | Task | Reason | Test Cases |").unwrap();
        writeln!(output, "|---------|------|--------|------------|").unwrap();
        for (benchmark, task) in mismatches {
            let ids: Vec<String> = task.test_cases.iter().map(|id| id.to_string()).collect();
            writeln!(
                output,
                "| {} | {} | {} | {} |",
                benchmark.program,
                task.task,
                task.match_detail.as_deref().unwrap_or("-"),
                ids.join(", ")
            )
            .unwrap();
        }
        writeln!(output).unwrap();
        output
    }

    /// @ai:effects pure
    fn benchmark_section(benchmarks: &[BenchmarkReport]) -> String {
        let mut output = String::new();

        writeln!(output, "## Benchmarks").unwrap();
        writeln!(output).unwrap();
        writeln!(output, "| Program | Verdict | Run Outcomes |").unwrap();
        writeln!(output, "|---------|---------|--------------|").unwrap();
        for benchmark in benchmarks {
            let outcomes: Vec<String> = benchmark.outcomes.iter().map(|o| o.to_string()).collect();
            writeln!(
                output,
                "| {} | {} | {} |",
                benchmark.program,
                benchmark.overall,
                outcomes.join("; ")
            )
            .unwrap();
        }
        writeln!(output).unwrap();
        output
    }

    /// @ai:effects pure
    fn skipped_section(skipped: &[String]) -> String {
        let mut output = String::new();
        if skipped.is_empty() {
            return output;
        }
        writeln!(output, "## Skipped").unwrap();
        writeln!(output).unwrap();
        for program in skipped {
            writeln!(output, "- {}", program).unwrap();
        }
        writeln!(output).unwrap();
        output
    }

    /// @ai:effects pure
    fn ranking_summary(results: &RankingResults) -> String {
        let mut output = String::new();
        let total = results.benchmarks.len();

        writeln!(output, "# KLEE Ranking Results").unwrap();
        writeln!(output).unwrap();
        writeln!(output, "**Date:** {}", results.timestamp).unwrap();
        writeln!(output, "**Benchmarks ranked:** {}", total).unwrap();
        writeln!(output).unwrap();

        writeln!(output, "## Wins").unwrap();
        writeln!(output).unwrap();
        writeln!(output, "| Index | File | Wins | Share | Reasons |").unwrap();
        writeln!(output, "|-------|------|------|-------|---------|").unwrap();
        for (index, stats) in results.wins.iter().enumerate() {
            let reasons: Vec<String> = stats
                .reasons
                .iter()
                .map(|(kind, count)| format!("{}: {}", kind, count))
                .collect();
            writeln!(
                output,
                "| {} | {} | {} | {} | {} |",
                index,
                stats.name,
                stats.wins,
                Self::format_share(stats.wins, total),
                reasons.join(", ")
            )
            .unwrap();
        }
        let tie_reasons: Vec<String> = results
            .tie_reasons
            .iter()
            .map(|(kind, count)| format!("{}: {}", kind, count))
            .collect();
        writeln!(
            output,
            "| - | ties | {} | {} | {} |",
            results.ties,
            Self::format_share(results.ties, total),
            tie_reasons.join(", ")
        )
        .unwrap();
        writeln!(output).unwrap();

        output
    }

    /// @ai:effects pure
    fn ranking_section(results: &RankingResults) -> String {
        let mut output = String::new();

        writeln!(output, "## Rankings").unwrap();
        writeln!(output).unwrap();
        writeln!(output, "| Program | Ranking |").unwrap();
        writeln!(output, "|---------|---------|").unwrap();
        for ranking in &results.benchmarks {
            let positions: Vec<String> = ranking.positions.iter().map(|p| p.to_string()).collect();
            writeln!(output, "| {} | {} |", ranking.program, positions.join(" > ")).unwrap();
        }
        writeln!(output).unwrap();
        output
    }
}

impl Default for MarkdownReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownReporterTrait for MarkdownReporter {
    /// @ai:intent Generate Markdown report to file
    /// @ai:effects fs:write
    fn generate_verification(&self, results: &VerificationResults, output_path: &Path) -> Result<()> {
        let mut content = String::new();

        content.push_str(&Self::verification_summary(results));
        content.push_str(&Self::task_section(results));
        content.push_str(&Self::mismatch_section(&results.benchmarks));
        content.push_str(&Self::benchmark_section(&results.benchmarks));
        content.push_str(&Self::skipped_section(&results.skipped));

        std::fs::write(output_path, content)?;
        Ok(())
    }

    /// @ai:intent Generate Markdown report to file
    /// @ai:effects fs:write
    fn generate_ranking(&self, results: &RankingResults, output_path: &Path) -> Result<()> {
        let mut content = String::new();

        content.push_str(&Self::ranking_summary(results));
        content.push_str(&Self::ranking_section(results));
        content.push_str(&Self::skipped_section(&results.skipped));

        std::fs::write(output_path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{BenchmarkRanking, MatchCounts, TaskReport, TaskStats, VerdictCounts, WinStats};
    use crate::rank::{RankPosition, RankReason};
    use crate::verification::{Verdict, VerificationTask};
    use tempfile::TempDir;

    #[test]
    fn test_format_share() {
        assert_eq!(MarkdownReporter::format_share(1, 4), "25.0%");
        assert_eq!(MarkdownReporter::format_share(0, 0), "-");
    }

    #[test]
    fn test_generate_verification_markdown() {
        let reporter = MarkdownReporter::new();
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("verification.md");

        let results = VerificationResults {
            timestamp: "2026-01-19T00:00:00Z".to_string(),
            result_info_file: "klee-runs.yml".to_string(),
            allow_invalid_klee_dir: false,
            benchmarks: vec![BenchmarkReport {
                program: "prog".to_string(),
                spec_name: Some("prog".to_string()),
                klee_dirs: vec!["/runs/0".to_string()],
                outcomes: vec![],
                overall: Verdict::Incorrect,
                tasks: vec![TaskReport {
                    task: VerificationTask::NoAssertFail,
                    verdict: Verdict::Incorrect,
                    unknown_reason: None,
                    test_cases: vec![3, 7],
                    spec_match: Some(MatchKind::Mismatch),
                    match_detail: Some("expected correct but was incorrect".to_string()),
                    false_positive: true,
                    true_positive: false,
                    warnings: vec![],
                }],
            }],
            by_task: vec![TaskStats {
                task: VerificationTask::NoAssertFail,
                verdicts: VerdictCounts {
                    correct: 0,
                    incorrect: 1,
                    unknown: 0,
                },
                matches: MatchCounts {
                    mismatched: 1,
                    false_positives: 1,
                    ..Default::default()
                },
            }],
            overall: VerdictCounts {
                correct: 0,
                incorrect: 1,
                unknown: 0,
            },
            skipped: vec![],
        };

        reporter.generate_verification(&results, &output).unwrap();
        let content = std::fs::read_to_string(&output).unwrap();
        assert!(content.contains("# KLEE Verification Results"));
        assert!(content.contains("| no_assert_fail | 0 | 1 | 0 | 0 | 1 | 1 | 0 |"));
        assert!(content.contains("## Mismatches"));
        assert!(content.contains("| 3, 7 |"));
        assert!(!content.contains("## Skipped"));
    }

    #[test]
    fn test_generate_ranking_markdown() {
        let reporter = MarkdownReporter::new();
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("ranking.md");

        let mut reasons = std::collections::BTreeMap::new();
        reasons.insert("crashes".to_string(), 1);
        let results = RankingResults {
            timestamp: "2026-01-19T00:00:00Z".to_string(),
            files: vec!["a.yml".to_string(), "b.yml".to_string()],
            benchmarks: vec![BenchmarkRanking {
                program: "prog".to_string(),
                positions: vec![
                    RankPosition {
                        indices: vec![1],
                        reason: RankReason::Crashes { count: 0 },
                    },
                    RankPosition {
                        indices: vec![0],
                        reason: RankReason::Crashes { count: 2 },
                    },
                ],
            }],
            wins: vec![
                WinStats {
                    name: "a.yml".to_string(),
                    ..Default::default()
                },
                WinStats {
                    name: "b.yml".to_string(),
                    wins: 1,
                    reasons,
                },
            ],
            ties: 0,
            tie_reasons: Default::default(),
            skipped: vec!["other".to_string()],
        };

        reporter.generate_ranking(&results, &output).unwrap();
        let content = std::fs::read_to_string(&output).unwrap();
        assert!(content.contains("| 1 | b.yml | 1 | 100.0% | crashes: 1 |"));
        assert!(content.contains("| prog | [1]: 0 crashes > [0]: 2 crashes |"));
        assert!(content.contains("- other"));
    }
}
