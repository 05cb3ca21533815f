//! @ai:module:intent Parse the strict line grammar of a KLEE `info` record
//! @ai:module:layer application
//! @ai:module:public_api RunInfo, parse_info_file
//! @ai:module:depends_on lines, error
//! @ai:module:stateless true

use crate::error::{Error, Result};
use crate::lines::LineReader;
use chrono::NaiveDateTime;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

static RE_PID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^PID: (\d+)$").expect("Invalid regex pattern"));
static RE_STARTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Started: (\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})$").expect("Invalid regex pattern")
});
static RE_FINISHED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Finished: (\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})$").expect("Invalid regex pattern")
});
static RE_ELAPSED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Elapsed: (\d{2}):(\d{2}):(\d{2})$").expect("Invalid regex pattern")
});
static RE_DONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^KLEE: done: ([a-z. ]+) = (\d+)$").expect("Invalid regex pattern")
});

const SEARCHER_BEGIN: &str = "BEGIN searcher description";
const SEARCHER_END: &str = "END searcher description";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// @ai:intent Contents of a complete KLEE `info` record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunInfo {
    pub command: String,
    pub pid: u64,
    pub start: NaiveDateTime,
    pub searcher: Vec<String>,
    pub finish: NaiveDateTime,
    pub elapsed: Duration,
    pub explored_paths: u64,
    pub constructs_per_query: u64,
    pub queries: u64,
    pub satisfiable_queries: u64,
    pub unsatisfiable_queries: u64,
    pub query_cex: u64,
    pub instructions: u64,
    pub completed_paths: u64,
    /// Declared number of generated tests
    pub tests: u64,
}

/// @ai:intent Read and parse an `info` file
/// @ai:pre path exists and is readable
/// @ai:post Ok(None) when the file has no first line (KLEE died before writing it)
/// @ai:effects fs:read
pub fn parse_info_file(path: &Path) -> Result<Option<RunInfo>> {
    tracing::debug!("Creating RunInfo from \"{}\"", path.display());
    let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    RunInfo::parse(&content, path)
}

/// @ai:intent Cursor over the info record that reports failures against its path
struct InfoCursor<'a> {
    reader: LineReader<'a>,
    path: PathBuf,
}

impl<'a> InfoCursor<'a> {
    fn error(&self, line: usize, message: impl Into<String>) -> Error {
        Error::InfoParse {
            path: self.path.clone(),
            line,
            message: message.into(),
        }
    }

    /// @ai:intent Read the next line, which must exist and be newline-terminated
    fn expect_line(&mut self, what: &str) -> Result<(usize, &'a str)> {
        let number = self.reader.upcoming_line_number();
        let line = self
            .reader
            .next_line()
            .ok_or_else(|| self.error(number, format!("missing {what}")))?;
        let body = line
            .terminated()
            .ok_or_else(|| self.error(number, format!("unterminated {what}")))?;
        Ok((number, body))
    }

    /// @ai:intent Match the next line against `re` and return its captures
    fn expect_match(&mut self, re: &Regex, what: &str) -> Result<regex::Captures<'a>> {
        let (number, body) = self.expect_line(what)?;
        re.captures(body)
            .ok_or_else(|| self.error(number, format!("does not contain a valid {what} entry")))
    }

    fn expect_timestamp(&mut self, re: &Regex, what: &str) -> Result<NaiveDateTime> {
        let number = self.reader.upcoming_line_number();
        let caps = self.expect_match(re, what)?;
        NaiveDateTime::parse_from_str(&caps[1], TIMESTAMP_FORMAT)
            .map_err(|e| self.error(number, format!("invalid {what} timestamp: {e}")))
    }

    /// @ai:intent Match a `KLEE: done: <key> = <int>` record with the given key
    fn expect_counter(&mut self, key: &str) -> Result<u64> {
        let number = self.reader.upcoming_line_number();
        let caps = self.expect_match(&RE_DONE, key)?;
        if &caps[1] != key {
            return Err(self.error(
                number,
                format!("expected \"{key}\" entry but found \"{}\"", &caps[1]),
            ));
        }
        parse_int(&caps[2]).map_err(|m| self.error(number, m))
    }

    fn expect_blank(&mut self, what: &str) -> Result<()> {
        let (number, body) = self.expect_line(what)?;
        if body.is_empty() {
            Ok(())
        } else {
            Err(self.error(number, format!("expected {what}")))
        }
    }

    fn parse_searcher(&mut self) -> Result<Vec<String>> {
        let (number, begin) = self.expect_line("begin searcher tag")?;
        if begin.trim_end() != SEARCHER_BEGIN {
            return Err(self.error(number, "does not contain a valid begin searcher tag"));
        }

        let mut searcher = Vec::new();
        loop {
            let number = self.reader.upcoming_line_number();
            let line = self
                .reader
                .next_line()
                .ok_or_else(|| self.error(number, "missing end searcher tag"))?;
            let body = crate::lines::trim_terminator(line.text).trim_end();
            if body == SEARCHER_END {
                return Ok(searcher);
            }
            searcher.push(body.to_string());
        }
    }
}

fn parse_int(digits: &str) -> std::result::Result<u64, String> {
    digits
        .parse::<u64>()
        .map_err(|e| format!("integer \"{digits}\" out of range: {e}"))
}

impl RunInfo {
    /// @ai:intent Parse the content of an `info` record
    /// @ai:post Ok(None) iff content has no first line
    /// @ai:effects pure
    pub fn parse(content: &str, path: &Path) -> Result<Option<Self>> {
        let mut cursor = InfoCursor {
            reader: LineReader::new(content),
            path: path.to_path_buf(),
        };

        let Some(first) = cursor.reader.next_line() else {
            return Ok(None);
        };
        let command = crate::lines::trim_terminator(first.text).trim_end().to_string();
        if command.is_empty() {
            return Err(cursor.error(1, "empty command"));
        }

        let pid_line = cursor.reader.upcoming_line_number();
        let pid = {
            let caps = cursor.expect_match(&RE_PID, "PID")?;
            parse_int(&caps[1]).map_err(|m| cursor.error(pid_line, m))?
        };
        let start = cursor.expect_timestamp(&RE_STARTED, "started")?;
        let searcher = cursor.parse_searcher()?;
        let finish = cursor.expect_timestamp(&RE_FINISHED, "finished")?;

        let elapsed_line = cursor.reader.upcoming_line_number();
        let elapsed = {
            let caps = cursor.expect_match(&RE_ELAPSED, "elapsed")?;
            let mut seconds = 0u64;
            for (idx, scale) in [(1usize, 3600u64), (2, 60), (3, 1)] {
                let part = parse_int(&caps[idx]).map_err(|m| cursor.error(elapsed_line, m))?;
                seconds += part * scale;
            }
            Duration::from_secs(seconds)
        };

        let explored_paths = cursor.expect_counter("explored paths")?;
        let constructs_per_query = cursor.expect_counter("avg. constructs per query")?;
        let queries = cursor.expect_counter("total queries")?;
        let satisfiable_queries = cursor.expect_counter("valid queries")?;
        let unsatisfiable_queries = cursor.expect_counter("invalid queries")?;
        let query_cex = cursor.expect_counter("query cex")?;
        cursor.expect_blank("empty line after query statistics")?;
        let instructions = cursor.expect_counter("total instructions")?;
        let completed_paths = cursor.expect_counter("completed paths")?;
        let tests = cursor.expect_counter("generated tests")?;

        let trailing = cursor.reader.upcoming_line_number();
        if cursor.reader.next_line().is_some() {
            return Err(cursor.error(trailing, "did not end as expected"));
        }

        Ok(Some(RunInfo {
            command,
            pid,
            start,
            searcher,
            finish,
            elapsed,
            explored_paths,
            constructs_per_query,
            queries,
            satisfiable_queries,
            unsatisfiable_queries,
            query_cex,
            instructions,
            completed_paths,
            tests,
        }))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_info(tests: u64) -> String {
        format!(
            "klee --output-dir=/tmp/klee-out-0 prog.bc\n\
             PID: 4242\n\
             Started: 2017-03-01 10:20:30\n\
             BEGIN searcher description\n\
             <InterleavedSearcher> containing 2 searchers:\n\
             RandomPathSearcher\n\
             </InterleavedSearcher>\n\
             END searcher description\n\
             Finished: 2017-03-01 11:22:33\n\
             Elapsed: 01:02:03\n\
             KLEE: done: explored paths = 12\n\
             KLEE: done: avg. constructs per query = 37\n\
             KLEE: done: total queries = 100\n\
             KLEE: done: valid queries = 40\n\
             KLEE: done: invalid queries = 60\n\
             KLEE: done: query cex = 100\n\
             \n\
             KLEE: done: total instructions = 123456\n\
             KLEE: done: completed paths = 12\n\
             KLEE: done: generated tests = {tests}\n"
        )
    }

    fn parse(content: &str) -> Result<Option<RunInfo>> {
        RunInfo::parse(content, Path::new("/tmp/klee-out-0/info"))
    }

    #[test]
    fn test_parse_complete_record() {
        let info = parse(&sample_info(5)).unwrap().unwrap();
        assert_eq!(info.pid, 4242);
        assert_eq!(info.searcher.len(), 3);
        assert_eq!(info.elapsed, Duration::from_secs(3723));
        assert_eq!(info.explored_paths, 12);
        assert_eq!(info.query_cex, 100);
        assert_eq!(info.instructions, 123456);
        assert_eq!(info.tests, 5);
        assert_eq!(info.start.format(TIMESTAMP_FORMAT).to_string(), "2017-03-01 10:20:30");
    }

    #[test]
    fn test_empty_record_is_none() {
        assert!(parse("").unwrap().is_none());
    }

    #[test]
    fn test_blank_command_is_error() {
        assert!(matches!(parse("\nPID: 1\n"), Err(Error::InfoParse { line: 1, .. })));
    }

    #[test]
    fn test_truncated_record_is_error() {
        let full = sample_info(3);
        let truncated: String = full.lines().take(9).map(|l| format!("{l}\n")).collect();
        assert!(matches!(parse(&truncated), Err(Error::InfoParse { .. })));
    }

    #[test]
    fn test_missing_blank_separator_is_error() {
        let broken = sample_info(3).replace("query cex = 100\n\n", "query cex = 100\n");
        match parse(&broken) {
            Err(Error::InfoParse { line, .. }) => assert_eq!(line, 17),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_trailing_content_is_error() {
        let extended = format!("{}extra\n", sample_info(3));
        assert!(parse(&extended).is_err());
    }

    #[test]
    fn test_unterminated_final_line_is_error() {
        let full = sample_info(3);
        assert!(parse(full.trim_end_matches('\n')).is_err());
    }

    #[test]
    fn test_crlf_terminators_accepted() {
        let crlf = sample_info(2).replace('\n', "\r\n");
        assert_eq!(parse(&crlf).unwrap().unwrap().tests, 2);
    }

    #[test]
    fn test_counter_key_must_match_position() {
        let swapped = sample_info(2).replace("total queries", "valid queries");
        assert!(parse(&swapped).is_err());
    }
}
