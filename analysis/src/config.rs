//! @ai:module:intent Configuration structs for verification and ranking runs
//! @ai:module:layer infrastructure
//! @ai:module:public_api AnalysisConfig, VerifyConfig, RankConfig, FilterConfig
//! @ai:module:stateless true

use crate::rank::RankOptions;
use crate::spec::BenchmarkSpec;
use crate::verification::VerificationTask;
use serde::{Deserialize, Serialize};

/// @ai:intent Main configuration for the analysis tool
/// @ai:effects pure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub verify: VerifyConfig,
    #[serde(default)]
    pub rank: RankConfig,
    #[serde(default)]
    pub filter: FilterConfig,
}

/// @ai:intent Verification settings
/// @ai:effects pure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerifyConfig {
    /// Classify runs whose `info` record is missing or truncated
    #[serde(default)]
    pub allow_invalid_klee_dir: bool,
    /// Tasks to check; empty means every task
    #[serde(default)]
    pub tasks: Vec<VerificationTask>,
}

/// @ai:intent Ranking settings
/// @ai:effects pure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankConfig {
    #[serde(default = "default_coverage_confidence")]
    pub coverage_confidence: f64,
    #[serde(default = "default_time_confidence")]
    pub time_confidence: f64,
    #[serde(default)]
    pub max_exec_time: Option<f64>,
}

/// @ai:intent Benchmark selection by category
/// @ai:effects pure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// A benchmark must carry every listed category
    #[serde(default)]
    pub categories: Vec<String>,
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            coverage_confidence: default_coverage_confidence(),
            time_confidence: default_time_confidence(),
            max_exec_time: None,
        }
    }
}

fn default_coverage_confidence() -> f64 {
    0.95
}

fn default_time_confidence() -> f64 {
    0.99
}

impl AnalysisConfig {
    /// @ai:intent Load configuration from a TOML file
    /// @ai:pre path exists and is readable
    /// @ai:effects fs:read
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// @ai:intent Save configuration to a TOML file
    /// @ai:effects fs:write
    pub fn save(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// @ai:intent Reject confidence levels outside (0, 1) and non-positive time limits
    /// @ai:effects pure
    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, level) in [
            ("coverage_confidence", self.rank.coverage_confidence),
            ("time_confidence", self.rank.time_confidence),
        ] {
            if !(level > 0.0 && level < 1.0) {
                anyhow::bail!("rank.{} must be between 0 and 1, got {}", name, level);
            }
        }
        if let Some(max) = self.rank.max_exec_time {
            if max <= 0.0 {
                anyhow::bail!("rank.max_exec_time must be positive, got {}", max);
            }
        }
        Ok(())
    }
}

impl VerifyConfig {
    /// @ai:intent Tasks to check, in canonical order
    /// @ai:effects pure
    pub fn selected_tasks(&self) -> Vec<VerificationTask> {
        VerificationTask::ALL
            .into_iter()
            .filter(|t| self.tasks.is_empty() || self.tasks.contains(t))
            .collect()
    }
}

impl RankConfig {
    pub fn options(&self) -> RankOptions {
        RankOptions {
            coverage_confidence: self.coverage_confidence,
            time_confidence: self.time_confidence,
            max_exec_time: self.max_exec_time,
        }
    }
}

impl FilterConfig {
    /// @ai:intent Check if a benchmark passes the category filter
    /// @ai:effects pure
    pub fn matches(&self, spec: &BenchmarkSpec) -> bool {
        spec.has_categories(&self.categories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_from_empty_file() {
        let config: AnalysisConfig = toml::from_str("").unwrap();
        assert_eq!(config, AnalysisConfig::default());
        assert_eq!(config.rank.coverage_confidence, 0.95);
        assert_eq!(config.rank.time_confidence, 0.99);
        assert_eq!(config.verify.selected_tasks().len(), VerificationTask::ALL.len());
    }

    #[test]
    fn test_partial_file() {
        let config: AnalysisConfig = toml::from_str(
            r#"
[verify]
tasks = ["no_overshift", "no_assert_fail"]

[rank]
max_exec_time = 900.0
"#,
        )
        .unwrap();
        assert_eq!(
            config.verify.selected_tasks(),
            vec![VerificationTask::NoAssertFail, VerificationTask::NoOvershift]
        );
        assert_eq!(config.rank.options().max_exec_time, Some(900.0));
        assert_eq!(config.rank.time_confidence, 0.99);
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("analysis.toml");
        let mut config = AnalysisConfig::default();
        config.filter.categories = vec!["issta_2017".to_string()];
        config.save(&path).unwrap();
        assert_eq!(AnalysisConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_confidence_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("analysis.toml");
        std::fs::write(&path, "[rank]\ncoverage_confidence = 1.5\n").unwrap();
        assert!(AnalysisConfig::load(&path).is_err());
    }

    #[test]
    fn test_filter_matches_categories() {
        let spec = BenchmarkSpec {
            name: "b".to_string(),
            categories: vec!["a".to_string(), "b".to_string()],
            verification_tasks: Default::default(),
        };
        assert!(FilterConfig::default().matches(&spec));
        let filter = FilterConfig {
            categories: vec!["a".to_string()],
        };
        assert!(filter.matches(&spec));
        let filter = FilterConfig {
            categories: vec!["a".to_string(), "c".to_string()],
        };
        assert!(!filter.matches(&spec));
    }
}
