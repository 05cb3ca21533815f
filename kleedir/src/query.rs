//! @ai:module:intent Query surface shared by single runs and repeated-run proxies
//! @ai:module:layer domain
//! @ai:module:public_api RunDirectory
//! @ai:module:depends_on test_case
//! @ai:module:stateless true

use crate::test_case::{ErrorCategory, TestCase};
use std::path::Path;

/// @ai:intent Read-only view over the test cases of one or more KLEE runs
pub trait RunDirectory: Send + Sync {
    /// @ai:intent Directories backing this view, one per run
    fn paths(&self) -> Vec<&Path>;

    /// @ai:intent All test cases, in run order then identifier order
    fn tests(&self) -> &[TestCase];

    /// @ai:intent Whether every backing run has a complete `info` record
    fn is_valid(&self) -> bool;

    /// @ai:intent Whether any backing run hit KLEE's halt timer
    fn halt_timer_invoked(&self) -> bool;

    /// @ai:intent Number of declared tests whose `.ktest` file is missing
    fn lost_test_cases(&self) -> usize;

    fn successful_terminations(&self) -> Vec<&TestCase> {
        self.tests().iter().filter(|t| t.is_successful()).collect()
    }

    fn early_terminations(&self) -> Vec<&TestCase> {
        self.tests()
            .iter()
            .filter(|t| t.is_early_termination())
            .collect()
    }

    /// @ai:intent All test cases that hit an error of any category
    fn errors(&self) -> Vec<&TestCase> {
        self.tests().iter().filter(|t| t.error().is_some()).collect()
    }

    fn errors_of(&self, category: ErrorCategory) -> Vec<&TestCase> {
        self.tests()
            .iter()
            .filter(|t| t.category() == Some(category))
            .collect()
    }
}
