//! @ai:module:intent Benchmark specifications and matching verdicts against them
//! @ai:module:layer application
//! @ai:module:public_api BenchmarkSpec, TaskSpec, SpecMatch, MatchKind, match_against_spec
//! @ai:module:stateless true

pub mod matcher;
pub mod model;

pub use matcher::{
    match_against_spec, observed_file_matches, MatchKind, MatchWarning, MismatchReason, SpecMatch,
    UnknownMatchReason,
};
pub use model::{BenchmarkSpec, CounterExample, SourceLocation, TaskSpec};
