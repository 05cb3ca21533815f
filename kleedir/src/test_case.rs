//! @ai:module:intent Build one KLEE test case from its on-disk artifacts
//! @ai:module:layer domain
//! @ai:module:public_api TestCase, TestOutcome, ErrorCategory, ErrorReport
//! @ai:module:depends_on artifacts, lines, error
//! @ai:module:stateless true

use crate::artifacts::TestArtifacts;
use crate::error::{Error, Result};
use crate::lines::LineReader;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static RE_ERROR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Error: (.*)$").expect("Invalid regex pattern"));
static RE_FILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^File: (.*)$").expect("Invalid regex pattern"));
static RE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Line: (\d+)$").expect("Invalid regex pattern"));
static RE_ASSEMBLY_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^assembly\.ll line: (\d+)$").expect("Invalid regex pattern"));

/// @ai:intent Closed set of KLEE error kinds, keyed by the `.err` file suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Abort,
    Assertion,
    Division,
    Free,
    Overflow,
    Overshift,
    Pointer,
    ReadOnly,
    User,
    Execution,
    Misc,
}

impl ErrorCategory {
    pub const ALL: [ErrorCategory; 11] = [
        ErrorCategory::Abort,
        ErrorCategory::Assertion,
        ErrorCategory::Division,
        ErrorCategory::Free,
        ErrorCategory::Overflow,
        ErrorCategory::Overshift,
        ErrorCategory::Pointer,
        ErrorCategory::ReadOnly,
        ErrorCategory::User,
        ErrorCategory::Execution,
        ErrorCategory::Misc,
    ];

    /// @ai:intent Map an artifact suffix (`test000001.<suffix>.err`) to its category
    /// @ai:post unknown suffixes map to Misc
    /// @ai:effects pure
    pub fn from_suffix(suffix: &str) -> Self {
        match suffix {
            "abort" => ErrorCategory::Abort,
            "assert" => ErrorCategory::Assertion,
            "div" => ErrorCategory::Division,
            "free" => ErrorCategory::Free,
            "overflow" => ErrorCategory::Overflow,
            "overshift" => ErrorCategory::Overshift,
            "ptr" => ErrorCategory::Pointer,
            "readonly" => ErrorCategory::ReadOnly,
            "user" => ErrorCategory::User,
            "exec" => ErrorCategory::Execution,
            _ => ErrorCategory::Misc,
        }
    }

    /// @ai:intent Convert category to string representation
    /// @ai:effects pure
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Abort => "abort",
            ErrorCategory::Assertion => "assertion",
            ErrorCategory::Division => "division",
            ErrorCategory::Free => "free",
            ErrorCategory::Overflow => "overflow",
            ErrorCategory::Overshift => "overshift",
            ErrorCategory::Pointer => "pointer",
            ErrorCategory::ReadOnly => "read-only",
            ErrorCategory::User => "user",
            ErrorCategory::Execution => "execution",
            ErrorCategory::Misc => "misc",
        }
    }

    /// @ai:intent Whether an error of this kind necessarily halts the path
    /// @ai:effects pure
    pub fn is_terminating(&self) -> bool {
        matches!(self, ErrorCategory::Assertion | ErrorCategory::Abort)
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// @ai:intent Parsed contents of a `.err` file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorReport {
    pub message: String,
    pub file: String,
    pub line: u64,
    pub assembly_line: u64,
    pub stack: Vec<String>,
}

/// @ai:intent Exactly one way a test case's path ended
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TestOutcome {
    Successful,
    EarlyTermination { message: Vec<String> },
    Error { category: ErrorCategory, report: ErrorReport },
}

/// @ai:intent A single generated KLEE test case
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TestCase {
    pub identifier: u32,
    /// Directory joined with `test{identifier:06}`
    pub path_stub: PathBuf,
    pub outcome: TestOutcome,
    /// False when KLEE declared the test but its `.ktest` file is missing
    pub has_ktest: bool,
}

impl TestCase {
    /// @ai:intent Build a test case from the artifacts found for its identifier
    /// @ai:pre artifacts passed ArtifactIndex::check_integrity
    /// @ai:post outcome is Error iff an `.err` file exists, else EarlyTermination iff `.early` exists
    /// @ai:effects fs:read
    pub fn load(dir: &Path, identifier: u32, artifacts: &TestArtifacts) -> Result<Self> {
        let path_stub = dir.join(format!("test{identifier:06}"));
        tracing::debug!("Creating test with pathstub \"{}\"", path_stub.display());

        let outcome = if let Some((suffix, path)) = artifacts.errors.first() {
            TestOutcome::Error {
                category: ErrorCategory::from_suffix(suffix),
                report: parse_error_file(path)?,
            }
        } else if let Some(path) = &artifacts.early {
            TestOutcome::EarlyTermination {
                message: read_lines(path)?,
            }
        } else {
            TestOutcome::Successful
        };

        Ok(Self {
            identifier,
            path_stub,
            outcome,
            has_ktest: artifacts.ktest.is_some(),
        })
    }

    /// @ai:intent Path to the matching .ktest file
    pub fn ktest_path(&self) -> PathBuf {
        self.path_stub.with_extension("ktest")
    }

    /// @ai:intent Path to the matching .pc file
    pub fn pc_path(&self) -> PathBuf {
        self.path_stub.with_extension("pc")
    }

    pub fn is_successful(&self) -> bool {
        matches!(self.outcome, TestOutcome::Successful)
    }

    pub fn is_early_termination(&self) -> bool {
        matches!(self.outcome, TestOutcome::EarlyTermination { .. })
    }

    /// @ai:intent Error category and report, if this test hit an error
    pub fn error(&self) -> Option<(ErrorCategory, &ErrorReport)> {
        match &self.outcome {
            TestOutcome::Error { category, report } => Some((*category, report)),
            _ => None,
        }
    }

    pub fn category(&self) -> Option<ErrorCategory> {
        self.error().map(|(category, _)| category)
    }

    /// @ai:intent `file:line` of the error, or `<unknown>` for non-error tests
    /// @ai:effects pure
    pub fn location(&self) -> String {
        match self.error() {
            Some((_, report)) => format!("{}:{}", report.file, report.line),
            None => "<unknown>".to_string(),
        }
    }
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(LineReader::new(&content).remaining())
}

/// @ai:intent Read and parse a `.err` file
/// @ai:effects fs:read
pub fn parse_error_file(path: &Path) -> Result<ErrorReport> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_error_report(&content, path)
}

/// @ai:intent Parse the five header lines and stack trace of an error report
/// @ai:effects pure
pub fn parse_error_report(content: &str, path: &Path) -> Result<ErrorReport> {
    let mut reader = LineReader::new(content);
    let fail = |line: usize, message: &str| Error::ErrorFileParse {
        path: path.to_path_buf(),
        line,
        message: message.to_string(),
    };

    let mut header = |re: &Regex, message: &str| -> Result<String> {
        let number = reader.upcoming_line_number();
        reader
            .next_line()
            .and_then(|l| l.terminated())
            .and_then(|body| re.captures(body))
            .map(|caps| caps[1].to_string())
            .ok_or_else(|| fail(number, message))
    };

    let message = header(&RE_ERROR, "Invalid error message")?;
    let file = header(&RE_FILE, "Invalid file")?;
    let line_text = header(&RE_LINE, "Invalid line number")?;
    let assembly_text = header(&RE_ASSEMBLY_LINE, "Invalid assembly.ll line number")?;

    let line = line_text
        .parse::<u64>()
        .map_err(|_| fail(3, "Line number out of range"))?;
    let assembly_line = assembly_text
        .parse::<u64>()
        .map_err(|_| fail(4, "assembly.ll line number out of range"))?;

    let stack_marker = reader.next_line().map(|l| crate::lines::trim_terminator(l.text).trim_end());
    if stack_marker != Some("Stack:") {
        return Err(fail(5, "Invalid begin stacktrace stack"));
    }

    Ok(ErrorReport {
        message,
        file,
        line,
        assembly_line,
        stack: reader.remaining(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const ASSERT_REPORT: &str = "Error: ASSERTION FAIL: x != 0\n\
        File: /home/user/bench/file.c\n\
        Line: 12\n\
        assembly.ll line: 57\n\
        Stack: \n\
        \t#000000057 in main () at /home/user/bench/file.c:12\n";

    #[test]
    fn test_parse_error_report() {
        let report = parse_error_report(ASSERT_REPORT, Path::new("t.assert.err")).unwrap();
        assert_eq!(report.message, "ASSERTION FAIL: x != 0");
        assert_eq!(report.file, "/home/user/bench/file.c");
        assert_eq!(report.line, 12);
        assert_eq!(report.assembly_line, 57);
        assert_eq!(report.stack.len(), 1);
    }

    #[test]
    fn test_bad_header_reports_line() {
        let broken = ASSERT_REPORT.replace("Line: 12", "Line: twelve");
        match parse_error_report(&broken, Path::new("t.assert.err")) {
            Err(Error::ErrorFileParse { line, .. }) => assert_eq!(line, 3),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_missing_stack_marker() {
        let broken = ASSERT_REPORT.replace("Stack: ", "Trace:");
        assert!(matches!(
            parse_error_report(&broken, Path::new("t.err")),
            Err(Error::ErrorFileParse { line: 5, .. })
        ));
    }

    #[test]
    fn test_category_suffixes() {
        assert_eq!(ErrorCategory::from_suffix("ptr"), ErrorCategory::Pointer);
        assert_eq!(ErrorCategory::from_suffix("readonly"), ErrorCategory::ReadOnly);
        assert_eq!(ErrorCategory::from_suffix("model"), ErrorCategory::Misc);
        assert!(ErrorCategory::Abort.is_terminating());
        assert!(!ErrorCategory::Overshift.is_terminating());
    }

    #[test]
    fn test_load_each_outcome_kind() {
        let temp = TempDir::new().unwrap();
        let err_path = temp.path().join("test000001.assert.err");
        std::fs::write(&err_path, ASSERT_REPORT).unwrap();
        let early_path = temp.path().join("test000002.early");
        std::fs::write(&early_path, "Halting early\n").unwrap();

        let error_artifacts = TestArtifacts {
            errors: vec![("assert".to_string(), err_path)],
            ..Default::default()
        };
        let test = TestCase::load(temp.path(), 1, &error_artifacts).unwrap();
        assert_eq!(test.category(), Some(ErrorCategory::Assertion));
        assert_eq!(test.location(), "/home/user/bench/file.c:12");
        assert!(!test.has_ktest);

        let early_artifacts = TestArtifacts {
            early: Some(early_path),
            ..Default::default()
        };
        let early = TestCase::load(temp.path(), 2, &early_artifacts).unwrap();
        assert_eq!(
            early.outcome,
            TestOutcome::EarlyTermination {
                message: vec!["Halting early".to_string()]
            }
        );

        let plain = TestCase::load(temp.path(), 3, &TestArtifacts::default()).unwrap();
        assert!(plain.is_successful());
        assert!(plain.ktest_path().ends_with("test000003.ktest"));
        assert!(plain.pc_path().ends_with("test000003.pc"));
    }
}
