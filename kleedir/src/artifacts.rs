//! @ai:module:intent Index the test-case artifacts of a run directory in one scan
//! @ai:module:layer infrastructure
//! @ai:module:public_api ArtifactIndex, TestArtifacts, scan_artifacts
//! @ai:module:depends_on error
//! @ai:module:stateless true

use crate::error::{Error, Result};
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use walkdir::WalkDir;

static RE_ARTIFACT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^test(\d+)\.(?:(ktest)|(pc)|(early)|(.+?)\.err)$")
        .expect("Invalid regex pattern")
});

/// @ai:intent Files on disk that belong to one test identifier
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestArtifacts {
    pub ktest: Option<PathBuf>,
    pub pc: Option<PathBuf>,
    pub early: Option<PathBuf>,
    /// `(suffix, path)` pairs; more than one is an integrity violation
    pub errors: Vec<(String, PathBuf)>,
}

/// @ai:intent Immutable identifier -> artifacts map, ordered numerically
#[derive(Debug, Clone, Default)]
pub struct ArtifactIndex {
    by_identifier: BTreeMap<u32, TestArtifacts>,
}

impl ArtifactIndex {
    /// @ai:intent Number of distinct test identifiers found
    pub fn len(&self) -> usize {
        self.by_identifier.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_identifier.is_empty()
    }

    /// @ai:intent Iterate identifiers with their artifacts in ascending numeric order
    pub fn iter(&self) -> impl Iterator<Item = (u32, &TestArtifacts)> {
        self.by_identifier.iter().map(|(id, a)| (*id, a))
    }

    pub fn get(&self, identifier: u32) -> Option<&TestArtifacts> {
        self.by_identifier.get(&identifier)
    }

    /// @ai:intent Record one file name, ignoring anything that is not a test artifact
    /// @ai:effects state mutation
    fn insert(&mut self, path: PathBuf, file_name: &str) {
        let Some(caps) = RE_ARTIFACT.captures(file_name) else {
            return;
        };
        let Ok(identifier) = caps[1].parse::<u32>() else {
            tracing::warn!("Ignoring test artifact with oversized identifier: {}", file_name);
            return;
        };

        let entry = self.by_identifier.entry(identifier).or_default();
        if caps.get(2).is_some() {
            entry.ktest = Some(path);
        } else if caps.get(3).is_some() {
            entry.pc = Some(path);
        } else if caps.get(4).is_some() {
            entry.early = Some(path);
        } else if let Some(suffix) = caps.get(5) {
            entry.errors.push((suffix.as_str().to_string(), path));
        }
    }

    /// @ai:intent Reject identifiers that break the one-outcome-per-test invariants
    /// @ai:effects pure
    pub fn check_integrity(&self, dir: &Path) -> Result<()> {
        for (identifier, artifacts) in self.iter() {
            if artifacts.errors.len() > 1 {
                tracing::error!(
                    "Test {:06} in {} has error files {:?}",
                    identifier,
                    dir.display(),
                    artifacts.errors
                );
                return Err(Error::MultipleErrorFiles {
                    path: dir.to_path_buf(),
                    identifier,
                });
            }
            if !artifacts.errors.is_empty() && artifacts.early.is_some() {
                return Err(Error::ConflictingArtifacts {
                    path: dir.to_path_buf(),
                    identifier,
                });
            }
        }
        Ok(())
    }
}

/// @ai:intent Scan the top level of `dir` for `test<N>.*` artifacts
/// @ai:pre dir exists
/// @ai:post every identifier has at most one error file and not both error and early files
/// @ai:effects fs:read
pub fn scan_artifacts(dir: &Path) -> Result<ArtifactIndex> {
    let mut index = ArtifactIndex::default();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(file_name) = entry.file_name().to_str() else {
            continue;
        };
        index.insert(entry.path().to_path_buf(), file_name);
    }

    // walkdir does not sort; the BTreeMap keeps identifiers numeric,
    // the error list is sorted so reports are stable
    for artifacts in index.by_identifier.values_mut() {
        artifacts.errors.sort();
    }

    index.check_integrity(dir)?;
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"").unwrap();
    }

    #[test]
    fn test_identifiers_are_numeric_not_lexical() {
        let temp = TempDir::new().unwrap();
        for name in ["test000010.ktest", "test000002.ktest", "test000001.ktest"] {
            touch(temp.path(), name);
        }
        let index = scan_artifacts(temp.path()).unwrap();
        let ids: Vec<u32> = index.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![1, 2, 10]);
    }

    #[test]
    fn test_groups_artifacts_by_identifier() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "test000001.ktest");
        touch(temp.path(), "test000001.pc");
        touch(temp.path(), "test000001.assert.err");
        touch(temp.path(), "test000002.early");
        touch(temp.path(), "messages.txt");
        touch(temp.path(), "assembly.ll");

        let index = scan_artifacts(temp.path()).unwrap();
        assert_eq!(index.len(), 2);
        let first = index.get(1).unwrap();
        assert!(first.ktest.is_some());
        assert!(first.pc.is_some());
        assert_eq!(first.errors[0].0, "assert");
        assert!(index.get(2).unwrap().early.is_some());
    }

    #[test]
    fn test_error_suffix_with_dash_or_dot() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "test000001.ktest");
        touch(temp.path(), "test000001.bad-access.err");
        touch(temp.path(), "test000002.ktest");
        touch(temp.path(), "test000002.model.bad.err");

        let index = scan_artifacts(temp.path()).unwrap();
        assert_eq!(index.get(1).unwrap().errors[0].0, "bad-access");
        assert_eq!(index.get(2).unwrap().errors[0].0, "model.bad");
        assert_eq!(
            crate::ErrorCategory::from_suffix("bad-access"),
            crate::ErrorCategory::Misc
        );
    }

    #[test]
    fn test_two_error_files_is_fatal() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "test000003.ptr.err");
        touch(temp.path(), "test000003.free.err");
        match scan_artifacts(temp.path()) {
            Err(Error::MultipleErrorFiles { identifier, .. }) => assert_eq!(identifier, 3),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_error_and_early_is_fatal() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "test000004.div.err");
        touch(temp.path(), "test000004.early");
        assert!(matches!(
            scan_artifacts(temp.path()),
            Err(Error::ConflictingArtifacts { identifier: 4, .. })
        ));
    }
}
