//! @ai:module:intent KLEE run-directory parser library
//! @ai:module:layer infrastructure
//! @ai:module:public_api artifacts, dir, error, info, output, proxy, query, test_case
//! @ai:module:stateless true
//!
//! # kleedir
//!
//! Parses the output directory of one KLEE exploration run (the `info`
//! record, generated test cases and their `.err`/`.early` artifacts, and the
//! message logs) into an immutable snapshot.
//!
//! ## Example
//!
//! ```rust,no_run
//! use kleedir::{output, KleeDir, RunDirectory};
//! use std::path::Path;
//!
//! let dir = KleeDir::open(Path::new("klee-out-0")).unwrap();
//! println!("valid: {}, tests: {}", dir.is_valid(), dir.tests().len());
//! let summary = output::summarize(&dir);
//! println!("{}", output::format_summary(&summary, output::OutputFormat::Text, true).unwrap());
//! ```

pub mod artifacts;
pub mod dir;
pub mod error;
pub mod info;
mod lines;
pub mod output;
pub mod proxy;
pub mod query;
pub mod test_case;

pub use artifacts::{scan_artifacts, ArtifactIndex, TestArtifacts};
pub use dir::{KleeDir, HALT_TIMER_MESSAGE};
pub use error::{Error, Result};
pub use info::{parse_info_file, RunInfo};
pub use output::{format_summary, summarize, to_json, DirSummary, OutputFormat};
pub use proxy::KleeDirProxy;
pub use query::RunDirectory;
pub use test_case::{ErrorCategory, ErrorReport, TestCase, TestOutcome};
