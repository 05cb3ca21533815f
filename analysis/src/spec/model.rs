//! @ai:module:intent Benchmark specification records (augmented spec files)
//! @ai:module:layer domain
//! @ai:module:public_api BenchmarkSpec, TaskSpec, CounterExample, SourceLocation
//! @ai:module:stateless true

use crate::error::{Error, Result};
use crate::verification::VerificationTask;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// @ai:intent Human-authored description of a benchmark and its expected verdicts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkSpec {
    pub name: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub verification_tasks: BTreeMap<String, TaskSpec>,
}

/// @ai:intent Expected outcome for one verification task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    /// `None` when the author does not know
    pub correct: Option<bool>,
    #[serde(default)]
    pub counter_examples: Vec<CounterExample>,
    #[serde(default)]
    pub exhaustive_counter_examples: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterExample {
    #[serde(default)]
    pub description: Option<String>,
    pub locations: Vec<SourceLocation>,
}

/// @ai:intent A source position, `file` relative to the benchmark root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: u64,
}

impl BenchmarkSpec {
    /// @ai:intent Load and validate an augmented spec file
    /// @ai:pre path exists and is readable
    /// @ai:effects fs:read
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let spec = Self::from_yaml(&content, path)?;
        tracing::debug!("Loaded spec \"{}\"", path.display());
        Ok(spec)
    }

    /// @ai:intent Parse and validate spec YAML; `path` is only used in errors
    /// @ai:effects pure
    pub fn from_yaml(content: &str, path: &Path) -> Result<Self> {
        let spec: Self = serde_yaml::from_str(content).map_err(|source| Error::Yaml {
            path: path.to_path_buf(),
            source,
        })?;
        spec.validate()?;
        Ok(spec)
    }

    /// @ai:intent Reject internally contradictory task entries
    /// @ai:effects pure
    pub fn validate(&self) -> Result<()> {
        for (name, task) in &self.verification_tasks {
            if task.correct == Some(true) && !task.counter_examples.is_empty() {
                return Err(Error::InvalidSpec {
                    task: name.clone(),
                    message: "declared correct but lists counter examples".to_string(),
                });
            }
            let absolute = task
                .counter_examples
                .iter()
                .flat_map(|cex| cex.locations.iter())
                .find(|loc| loc.file.starts_with('/'));
            if let Some(loc) = absolute {
                return Err(Error::InvalidSpec {
                    task: name.clone(),
                    message: format!("counter example file \"{}\" must be relative", loc.file),
                });
            }
        }
        Ok(())
    }

    /// @ai:intent Look up the expectation for `task`
    /// @ai:effects pure
    pub fn task(&self, task: VerificationTask) -> Result<&TaskSpec> {
        self.verification_tasks
            .get(task.as_str())
            .ok_or_else(|| Error::MissingTaskSpec(task.as_str().to_string()))
    }

    /// @ai:intent True if the benchmark carries every category in `required`
    /// @ai:effects pure
    pub fn has_categories(&self, required: &[String]) -> bool {
        required.iter().all(|c| self.categories.contains(c))
    }
}

impl TaskSpec {
    /// @ai:intent Allowed counter-example locations as file -> set of lines
    /// @ai:effects pure
    pub fn allowed_locations(&self) -> BTreeMap<String, BTreeSet<u64>> {
        let mut allowed: BTreeMap<String, BTreeSet<u64>> = BTreeMap::new();
        for loc in self.counter_examples.iter().flat_map(|c| c.locations.iter()) {
            allowed.entry(loc.file.clone()).or_default().insert(loc.line);
        }
        allowed
    }
}
