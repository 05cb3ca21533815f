//! @ai:module:intent Define error types for verification, spec matching and ranking
//! @ai:module:layer domain
//! @ai:module:public_api Error, Result
//! @ai:module:stateless true

use crate::rank::RankError;
use std::path::PathBuf;
use thiserror::Error;

/// @ai:intent Unified error type for the analysis library
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Dir(#[from] kleedir::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Spec does not describe verification task \"{0}\"")]
    MissingTaskSpec(String),

    #[error("Invalid spec for task \"{task}\": {message}")]
    InvalidSpec { task: String, message: String },

    #[error("Result for \"{0}\" has no augmented spec file")]
    MissingSpecPath(String),

    #[error("Cannot summarize an empty list of verification results")]
    EmptySummary,

    #[error("Inconsistent result info for \"{program}\": {message}")]
    InconsistentResultInfo { program: String, message: String },

    #[error(transparent)]
    Rank(#[from] RankError),
}

pub type Result<T> = std::result::Result<T, Error>;
