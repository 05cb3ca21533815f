//! @ai:module:intent Format run-directory summaries for different formats (JSON, text)
//! @ai:module:layer infrastructure
//! @ai:module:public_api OutputFormat, DirSummary, summarize, format_summary, to_json
//! @ai:module:depends_on query, test_case
//! @ai:module:stateless true

use crate::error::Result;
use crate::query::RunDirectory;
use crate::test_case::{ErrorCategory, TestCase};
use colored::Colorize;
use serde::Serialize;
use std::collections::BTreeMap;

/// @ai:intent Output format options
#[derive(Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    JsonPretty,
}

/// @ai:intent Where one error test case failed
#[derive(Debug, Clone, Serialize)]
pub struct ErrorLocation {
    pub identifier: u32,
    pub category: ErrorCategory,
    pub location: String,
}

/// @ai:intent Counts and locations describing one (possibly merged) run directory
#[derive(Debug, Clone, Serialize)]
pub struct DirSummary {
    pub paths: Vec<String>,
    pub valid: bool,
    pub halt_timer_invoked: bool,
    pub total_tests: usize,
    pub successful_terminations: usize,
    pub early_terminations: usize,
    pub lost_test_cases: usize,
    pub errors_by_category: BTreeMap<ErrorCategory, usize>,
    pub error_locations: Vec<ErrorLocation>,
}

/// @ai:intent Collect the summary counts of a run directory
/// @ai:effects pure
pub fn summarize<D: RunDirectory + ?Sized>(dir: &D) -> DirSummary {
    let mut errors_by_category = BTreeMap::new();
    for category in ErrorCategory::ALL {
        errors_by_category.insert(category, dir.errors_of(category).len());
    }

    let error_locations = dir
        .errors()
        .into_iter()
        .filter_map(|t: &TestCase| {
            t.category().map(|category| ErrorLocation {
                identifier: t.identifier,
                category,
                location: t.location(),
            })
        })
        .collect();

    DirSummary {
        paths: dir.paths().iter().map(|p| p.display().to_string()).collect(),
        valid: dir.is_valid(),
        halt_timer_invoked: dir.halt_timer_invoked(),
        total_tests: dir.tests().len(),
        successful_terminations: dir.successful_terminations().len(),
        early_terminations: dir.early_terminations().len(),
        lost_test_cases: dir.lost_test_cases(),
        errors_by_category,
        error_locations,
    }
}

/// @ai:intent Format a directory summary as a string
/// @ai:effects pure
pub fn format_summary(
    summary: &DirSummary,
    format: OutputFormat,
    show_locations: bool,
) -> Result<String> {
    match format {
        OutputFormat::Json => to_json(summary, false),
        OutputFormat::JsonPretty => to_json(summary, true),
        OutputFormat::Text => Ok(format_summary_text(summary, show_locations)),
    }
}

/// @ai:intent Format a directory summary as human-readable text
/// @ai:effects pure
fn format_summary_text(summary: &DirSummary, show_locations: bool) -> String {
    let mut output = String::new();

    for path in &summary.paths {
        output.push_str(&format!("{}\n", path.bold()));
    }

    let validity = if summary.valid {
        "valid".green().bold()
    } else {
        "INVALID".red().bold()
    };
    output.push_str(&format!("  KLEE directory is {}\n", validity));

    if summary.halt_timer_invoked {
        output.push_str(&format!("  {}\n", "HaltTimer was invoked".yellow()));
    }

    output.push_str(&format!("  # of tests: {}\n", summary.total_tests));
    output.push_str(&format!(
        "  # of successful terminations: {}\n",
        summary.successful_terminations
    ));
    output.push_str(&format!(
        "  # of early terminations: {}\n",
        summary.early_terminations
    ));
    if summary.lost_test_cases > 0 {
        output.push_str(&format!(
            "  # of lost test cases: {}\n",
            summary.lost_test_cases.to_string().red()
        ));
    }

    for (category, count) in &summary.errors_by_category {
        if *count == 0 {
            continue;
        }
        output.push_str(&format!("  # of {} errors: {}\n", category, count.to_string().yellow()));

        if show_locations {
            for loc in summary.error_locations.iter().filter(|l| l.category == *category) {
                output.push_str(&format!(
                    "    Test {:06} in {}\n",
                    loc.identifier,
                    loc.location.dimmed()
                ));
            }
        }
    }

    output
}

/// @ai:intent Format any serializable value as JSON
/// @ai:effects pure
pub fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}
