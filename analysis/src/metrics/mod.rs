//! @ai:module:intent Aggregation of verification and ranking records
//! @ai:module:layer application
//! @ai:module:public_api MetricsAggregator, VerificationResults, RankingResults, BenchmarkReport, TaskReport

pub mod aggregator;
pub mod types;

pub use aggregator::{MetricsAggregator, MetricsAggregatorTrait};
pub use types::{
    BenchmarkRanking, BenchmarkReport, MatchCounts, RankingResults, TaskReport, TaskStats,
    VerdictCounts, VerificationResults, WinStats,
};
