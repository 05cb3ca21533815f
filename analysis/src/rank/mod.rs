//! @ai:module:intent Ranking of competing tool runs on the same benchmark
//! @ai:module:layer application
//! @ai:module:public_api rank, RankCandidate, RankOptions, RankPosition, RankReason, RankError, Sample, ConfidenceInterval

pub mod ranker;
pub mod stats;

pub use ranker::{
    rank, RankCandidate, RankError, RankOptions, RankPosition, RankReason, RunKind, Sample,
    TimeMeasure,
};
pub use stats::ConfidenceInterval;
