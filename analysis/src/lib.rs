//! @ai:module:intent KLEE run analysis library: verdicts, spec matching and ranking
//! @ai:module:layer application
//! @ai:module:public_api config, error, metrics, rank, report, result_info, spec, verification

pub mod config;
pub mod error;
pub mod metrics;
pub mod rank;
pub mod report;
pub mod result_info;
pub mod spec;
pub mod verification;

pub use config::AnalysisConfig;
pub use error::{Error, Result};
pub use metrics::{MetricsAggregator, RankingResults, VerificationResults};
pub use rank::{rank, RankCandidate, RankOptions, RankPosition, RankReason};
pub use report::ReportGenerator;
pub use result_info::{group_result_infos, ResultInfo, ResultInfos, RunOutcome};
pub use spec::{match_against_spec, BenchmarkSpec, SpecMatch, TaskSpec};
pub use verification::{classify, summarize_across_tasks, VerificationResult, VerificationTask};
