//! @ai:module:intent Present repeated KLEE runs of one benchmark as a single directory
//! @ai:module:layer application
//! @ai:module:public_api KleeDirProxy
//! @ai:module:depends_on dir, query, error
//! @ai:module:stateless true

use crate::dir::KleeDir;
use crate::error::{Error, Result};
use crate::query::RunDirectory;
use crate::test_case::TestCase;
use serde::Serialize;
use std::path::Path;

/// @ai:intent Read-only aggregate over N >= 1 runs with the same configuration
///
/// Per-test queries see the union of all runs' test cases. Whole-run scalars
/// are exposed per run (`validity`, `halt_timer_invocations`, ...) and folded
/// by the `RunDirectory` impl: valid iff all runs are valid, timer invoked if
/// any run hit it, lost test cases summed.
#[derive(Debug, Clone, Serialize)]
pub struct KleeDirProxy {
    dirs: Vec<KleeDir>,
    tests: Vec<TestCase>,
}

impl KleeDirProxy {
    /// @ai:intent Open every run directory and build the union view
    /// @ai:pre paths is non-empty
    /// @ai:effects fs:read
    pub fn open<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let dirs = paths
            .iter()
            .map(|p| {
                tracing::debug!("Trying to create KleeDir from \"{}\"", p.as_ref().display());
                KleeDir::open(p.as_ref())
            })
            .collect::<Result<Vec<_>>>()?;
        Self::from_dirs(dirs)
    }

    /// @ai:intent Wrap already-opened runs
    /// @ai:pre dirs is non-empty
    pub fn from_dirs(dirs: Vec<KleeDir>) -> Result<Self> {
        if dirs.is_empty() {
            return Err(Error::EmptyProxy);
        }
        let tests = dirs.iter().flat_map(|d| d.tests.iter().cloned()).collect();
        Ok(Self { dirs, tests })
    }

    /// @ai:intent The individual runs, in the order given
    pub fn dirs(&self) -> &[KleeDir] {
        &self.dirs
    }

    pub fn validity(&self) -> Vec<bool> {
        self.dirs.iter().map(|d| d.is_valid()).collect()
    }

    pub fn halt_timer_invocations(&self) -> Vec<bool> {
        self.dirs.iter().map(|d| d.halt_timer_invoked()).collect()
    }

    pub fn messages(&self) -> Vec<&[String]> {
        self.dirs.iter().map(|d| d.messages.as_slice()).collect()
    }

    pub fn warnings(&self) -> Vec<&[String]> {
        self.dirs.iter().map(|d| d.warnings.as_slice()).collect()
    }
}

impl RunDirectory for KleeDirProxy {
    fn paths(&self) -> Vec<&Path> {
        self.dirs.iter().map(|d| d.path.as_path()).collect()
    }

    fn tests(&self) -> &[TestCase] {
        &self.tests
    }

    fn is_valid(&self) -> bool {
        self.dirs.iter().all(|d| d.is_valid())
    }

    fn halt_timer_invoked(&self) -> bool {
        self.dirs.iter().any(|d| d.halt_timer_invoked())
    }

    fn lost_test_cases(&self) -> usize {
        self.dirs.iter().map(|d| d.lost_test_cases()).sum()
    }
}
