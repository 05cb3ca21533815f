//! @ai:module:intent Verification task definitions (fp-bench correctness properties)
//! @ai:module:layer domain
//! @ai:module:public_api VerificationTask
//! @ai:module:stateless true

use kleedir::{ErrorCategory, RunDirectory, TestCase};
use serde::{Deserialize, Serialize};

/// @ai:intent A named correctness property checked against a benchmark
/// @ai:effects pure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationTask {
    NoAssertFail,
    NoReachErrorFunction,
    NoInvalidFree,
    NoInvalidDeref,
    NoIntegerDivisionByZero,
    NoOvershift,
}

impl VerificationTask {
    pub const ALL: [VerificationTask; 6] = [
        VerificationTask::NoAssertFail,
        VerificationTask::NoReachErrorFunction,
        VerificationTask::NoInvalidFree,
        VerificationTask::NoInvalidDeref,
        VerificationTask::NoIntegerDivisionByZero,
        VerificationTask::NoOvershift,
    ];

    /// @ai:intent Convert task to the name used in spec files
    /// @ai:effects pure
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationTask::NoAssertFail => "no_assert_fail",
            VerificationTask::NoReachErrorFunction => "no_reach_error_function",
            VerificationTask::NoInvalidFree => "no_invalid_free",
            VerificationTask::NoInvalidDeref => "no_invalid_deref",
            VerificationTask::NoIntegerDivisionByZero => "no_integer_division_by_zero",
            VerificationTask::NoOvershift => "no_overshift",
        }
    }

    /// @ai:intent The single error category whose test cases are counter examples
    /// @ai:effects pure
    pub fn counter_example_category(&self) -> ErrorCategory {
        match self {
            VerificationTask::NoAssertFail => ErrorCategory::Assertion,
            VerificationTask::NoReachErrorFunction => ErrorCategory::Abort,
            VerificationTask::NoInvalidFree => ErrorCategory::Free,
            VerificationTask::NoInvalidDeref => ErrorCategory::Pointer,
            VerificationTask::NoIntegerDivisionByZero => ErrorCategory::Division,
            VerificationTask::NoOvershift => ErrorCategory::Overshift,
        }
    }

    /// @ai:intent Test cases in `dir` that violate this task
    /// @ai:effects pure
    pub fn counter_examples<'a, D: RunDirectory + ?Sized>(&self, dir: &'a D) -> Vec<&'a TestCase> {
        dir.errors_of(self.counter_example_category())
    }
}

impl std::fmt::Display for VerificationTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for VerificationTask {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VerificationTask::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown verification task \"{s}\""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_names() {
        for task in VerificationTask::ALL {
            assert_eq!(task.as_str().parse::<VerificationTask>().unwrap(), task);
        }
        assert!("no_memory_leak".parse::<VerificationTask>().is_err());
    }

    #[test]
    fn test_counter_example_categories_are_distinct() {
        let mut categories: Vec<_> = VerificationTask::ALL
            .iter()
            .map(|t| t.counter_example_category())
            .collect();
        categories.sort();
        categories.dedup();
        assert_eq!(categories.len(), VerificationTask::ALL.len());
    }
}
