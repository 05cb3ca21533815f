//! @ai:module:intent JSON report generation
//! @ai:module:layer infrastructure
//! @ai:module:public_api JsonReporter
//! @ai:module:stateless true

use crate::metrics::{RankingResults, VerificationResults};
use anyhow::Result;
use serde::Serialize;
use std::path::Path;

/// @ai:intent Trait for JSON report generation
pub trait JsonReporterTrait: Send + Sync {
    /// @ai:intent Generate JSON report from verification results
    fn generate_verification(&self, results: &VerificationResults, output_path: &Path) -> Result<()>;

    /// @ai:intent Generate JSON report from ranking results
    fn generate_ranking(&self, results: &RankingResults, output_path: &Path) -> Result<()>;
}

/// @ai:intent Generates JSON reports from analysis results
pub struct JsonReporter;

impl JsonReporter {
    /// @ai:intent Create a new JSON reporter
    /// @ai:effects pure
    pub fn new() -> Self {
        Self
    }

    /// @ai:effects fs:write
    fn write<T: Serialize>(value: &T, output_path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        std::fs::write(output_path, json)?;
        Ok(())
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonReporterTrait for JsonReporter {
    /// @ai:intent Generate JSON report to file
    /// @ai:effects fs:write
    fn generate_verification(&self, results: &VerificationResults, output_path: &Path) -> Result<()> {
        Self::write(results, output_path)
    }

    /// @ai:intent Generate JSON report to file
    /// @ai:effects fs:write
    fn generate_ranking(&self, results: &RankingResults, output_path: &Path) -> Result<()> {
        Self::write(results, output_path)
    }
}
