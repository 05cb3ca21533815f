//! @ai:module:intent Report generation for verification and ranking results
//! @ai:module:layer infrastructure
//! @ai:module:public_api ReportGenerator, JsonReporter, MarkdownReporter

pub mod json_report;
pub mod markdown_report;

pub use json_report::{JsonReporter, JsonReporterTrait};
pub use markdown_report::{MarkdownReporter, MarkdownReporterTrait};

use crate::metrics::{RankingResults, VerificationResults};
use anyhow::Result;
use std::path::Path;

/// @ai:intent Combined report generator
pub struct ReportGenerator {
    json: JsonReporter,
    markdown: MarkdownReporter,
}

impl ReportGenerator {
    /// @ai:intent Create a new report generator
    /// @ai:effects pure
    pub fn new() -> Self {
        Self {
            json: JsonReporter::new(),
            markdown: MarkdownReporter::new(),
        }
    }

    /// @ai:intent Write verification.json and verification.md
    /// @ai:effects fs:write
    pub fn generate_verification(&self, results: &VerificationResults, output_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(output_dir)?;

        self.json
            .generate_verification(results, &output_dir.join("verification.json"))?;
        self.markdown
            .generate_verification(results, &output_dir.join("verification.md"))?;

        tracing::info!("Reports generated in {}", output_dir.display());
        Ok(())
    }

    /// @ai:intent Write ranking.json and ranking.md
    /// @ai:effects fs:write
    pub fn generate_ranking(&self, results: &RankingResults, output_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(output_dir)?;

        self.json
            .generate_ranking(results, &output_dir.join("ranking.json"))?;
        self.markdown
            .generate_ranking(results, &output_dir.join("ranking.md"))?;

        tracing::info!("Reports generated in {}", output_dir.display());
        Ok(())
    }
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}
