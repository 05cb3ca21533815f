//! @ai:module:intent Open a KLEE output directory into an immutable snapshot
//! @ai:module:layer application
//! @ai:module:public_api KleeDir, HALT_TIMER_MESSAGE
//! @ai:module:depends_on info, artifacts, test_case, query, error
//! @ai:module:stateless true

use crate::artifacts::scan_artifacts;
use crate::error::{Error, Result};
use crate::info::{parse_info_file, RunInfo};
use crate::lines::LineReader;
use crate::query::RunDirectory;
use crate::test_case::TestCase;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Substring KLEE writes to `messages.txt` when its soft time limit fires
pub const HALT_TIMER_MESSAGE: &str = "HaltTimer invoked";

/// @ai:intent Snapshot of one KLEE run: metadata, test cases and logs
#[derive(Debug, Clone, Serialize)]
pub struct KleeDir {
    pub path: PathBuf,
    /// None when the `info` record is missing, empty or malformed
    pub info: Option<RunInfo>,
    pub tests: Vec<TestCase>,
    pub messages: Vec<String>,
    pub warnings: Vec<String>,
}

impl KleeDir {
    /// @ai:intent Open and parse a KLEE working directory
    /// @ai:pre path is a directory
    /// @ai:post if valid, tests.len() == info.tests
    /// @ai:effects fs:read
    pub fn open(path: &Path) -> Result<Self> {
        tracing::debug!("Creating KleeDir from \"{}\"", path.display());

        let info = load_info(path);
        let artifacts = scan_artifacts(path)?;

        if let Some(info) = &info {
            if artifacts.len() as u64 != info.tests {
                tracing::error!(
                    "{}: info declares {} tests, found {}",
                    path.display(),
                    info.tests,
                    artifacts.len()
                );
                return Err(Error::TestCountMismatch {
                    path: path.to_path_buf(),
                    declared: info.tests,
                    found: artifacts.len(),
                });
            }
        }

        let tests = artifacts
            .iter()
            .map(|(identifier, a)| TestCase::load(path, identifier, a))
            .collect::<Result<Vec<_>>>()?;

        let messages = read_log(&path.join("messages.txt"))?;
        let warnings = read_log(&path.join("warnings.txt"))?;

        Ok(Self {
            path: path.to_path_buf(),
            info,
            tests,
            messages,
            warnings,
        })
    }

    /// @ai:intent If the KLEE directory is in a valid state
    pub fn is_valid(&self) -> bool {
        self.info.is_some()
    }
}

impl RunDirectory for KleeDir {
    fn paths(&self) -> Vec<&Path> {
        vec![self.path.as_path()]
    }

    fn tests(&self) -> &[TestCase] {
        &self.tests
    }

    fn is_valid(&self) -> bool {
        KleeDir::is_valid(self)
    }

    fn halt_timer_invoked(&self) -> bool {
        self.messages.iter().any(|m| m.contains(HALT_TIMER_MESSAGE))
    }

    fn lost_test_cases(&self) -> usize {
        self.tests.iter().filter(|t| !t.has_ktest).count()
    }
}

/// @ai:intent Parse the `info` record, absorbing every failure as "invalid"
/// @ai:effects fs:read
fn load_info(dir: &Path) -> Option<RunInfo> {
    let info_path = dir.join("info");
    if !info_path.exists() {
        tracing::debug!("{} has no info file", dir.display());
        return None;
    }
    match parse_info_file(&info_path) {
        Ok(Some(info)) => Some(info),
        Ok(None) => {
            tracing::debug!("{} is empty", info_path.display());
            None
        }
        Err(e) => {
            tracing::debug!("Treating {} as invalid: {}", dir.display(), e);
            None
        }
    }
}

/// @ai:intent Read a free-form log file; a missing file reads as empty
/// @ai:effects fs:read
fn read_log(path: &Path) -> Result<Vec<String>> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(LineReader::new(&content).remaining()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("{} does not exist", path.display());
            Ok(Vec::new())
        }
        Err(e) => Err(Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}
