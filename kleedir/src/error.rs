//! @ai:module:intent Define error types for KLEE run-directory parsing
//! @ai:module:layer domain
//! @ai:module:public_api Error, Result
//! @ai:module:stateless true

use std::path::PathBuf;
use thiserror::Error;

/// @ai:intent Unified error type for all run-directory operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed `info` record. Absorbed by `KleeDir::open` as "invalid".
    #[error("Info file {path} line {line}: {message}")]
    InfoParse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Error file {path} line {line}: {message}")]
    ErrorFileParse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("{path}: info declares {declared} tests but {found} were found on disk")]
    TestCountMismatch {
        path: PathBuf,
        declared: u64,
        found: usize,
    },

    #[error("{path}: test {identifier:06} has more than one error file")]
    MultipleErrorFiles { path: PathBuf, identifier: u32 },

    #[error("{path}: test {identifier:06} has both an error file and an early termination file")]
    ConflictingArtifacts { path: PathBuf, identifier: u32 },

    #[error("Cannot create a proxy over zero KLEE directories")]
    EmptyProxy,

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// @ai:intent True for errors that mean the run data itself is inconsistent
    /// @ai:effects pure
    pub fn is_integrity_violation(&self) -> bool {
        matches!(
            self,
            Error::TestCountMismatch { .. }
                | Error::MultipleErrorFiles { .. }
                | Error::ConflictingArtifacts { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
