//! @ai:module:intent Load runner result records and derive run outcomes from them
//! @ai:module:layer infrastructure
//! @ai:module:public_api ResultInfos, ResultInfo, OneOrMany, RunOutcome, CoverageInfo, group_result_infos
//! @ai:module:depends_on spec::model
//! @ai:module:stateless true

use crate::error::{Error, Result};
use crate::spec::BenchmarkSpec;
use kleedir::{ErrorCategory, KleeDir, KleeDirProxy, RunDirectory};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// @ai:intent A field that merged results store per repetition and single results store once
///
/// Merged files collapse a list to a scalar when every repetition agreed, so
/// both shapes can appear in a merged record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T: Default> Default for OneOrMany<T> {
    fn default() -> Self {
        OneOrMany::One(T::default())
    }
}

impl<T: Clone> OneOrMany<T> {
    /// @ai:intent Values per repetition, broadcasting a scalar to `repetitions` copies
    /// @ai:effects pure
    pub fn per_repetition(&self, repetitions: usize) -> Vec<T> {
        match self {
            OneOrMany::One(v) => vec![v.clone(); repetitions],
            OneOrMany::Many(values) => values.clone(),
        }
    }

    /// @ai:intent Number of stored values when this is a list
    pub fn list_len(&self) -> Option<usize> {
        match self {
            OneOrMany::One(_) => None,
            OneOrMany::Many(values) => Some(values.len()),
        }
    }
}

/// @ai:intent Top-level result-info file written by the runner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultInfos {
    pub results: Vec<ResultInfo>,
    #[serde(default)]
    pub misc: serde_yaml::Value,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InvocationMisc {
    #[serde(default)]
    pub augmented_spec_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationInfo {
    pub program: String,
    #[serde(default)]
    pub misc: InvocationMisc,
}

/// @ai:intent One benchmark's execution record (single run or merged repetitions)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultInfo {
    #[serde(default)]
    pub exit_code: OneOrMany<Option<i32>>,
    #[serde(default)]
    pub out_of_memory: OneOrMany<bool>,
    #[serde(default)]
    pub backend_timeout: OneOrMany<bool>,
    pub klee_dir: OneOrMany<PathBuf>,
    #[serde(default)]
    pub user_cpu_time: OneOrMany<Option<f64>>,
    #[serde(default)]
    pub sys_cpu_time: OneOrMany<Option<f64>>,
    #[serde(default)]
    pub wallclock_time: OneOrMany<Option<f64>>,
    pub invocation_info: InvocationInfo,
    #[serde(default)]
    pub merged_result: bool,
}

/// @ai:intent How a run ran out of time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutKind {
    /// The runner killed the process
    Backend,
    /// KLEE's own halt timer fired
    SoftTimeout,
}

/// @ai:intent One observation about how a run went
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum RunOutcome {
    ValidKleeDir,
    BadExit(i32),
    OutOfMemory,
    OutOfTime(TimeoutKind),
    InvalidKleeDir,
    LostTestCases(usize),
    ExecutionErrors(Vec<u32>),
    UserErrors(Vec<u32>),
    MiscErrors(Vec<u32>),
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunOutcome::ValidKleeDir => write!(f, "valid KLEE directory"),
            RunOutcome::BadExit(code) => write!(f, "bad exit code {}", code),
            RunOutcome::OutOfMemory => write!(f, "out of memory"),
            RunOutcome::OutOfTime(TimeoutKind::Backend) => write!(f, "out of time (backend timeout)"),
            RunOutcome::OutOfTime(TimeoutKind::SoftTimeout) => write!(f, "out of time (soft timeout)"),
            RunOutcome::InvalidKleeDir => write!(f, "invalid KLEE directory"),
            RunOutcome::LostTestCases(n) => write!(f, "{} lost test cases", n),
            RunOutcome::ExecutionErrors(ids) => write!(f, "{} execution errors", ids.len()),
            RunOutcome::UserErrors(ids) => write!(f, "{} user errors", ids.len()),
            RunOutcome::MiscErrors(ids) => write!(f, "{} misc errors", ids.len()),
        }
    }
}

impl ResultInfos {
    /// @ai:intent Load a result-info YAML file and check each record's shape
    /// @ai:pre path exists and is readable
    /// @ai:effects fs:read
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let infos = Self::from_yaml(&content, path)?;
        tracing::info!(
            "Loaded {} result(s) from \"{}\"",
            infos.results.len(),
            path.display()
        );
        Ok(infos)
    }

    /// @ai:effects pure
    pub fn from_yaml(content: &str, path: &Path) -> Result<Self> {
        let infos: Self = serde_yaml::from_str(content).map_err(|source| Error::Yaml {
            path: path.to_path_buf(),
            source,
        })?;
        for result in &infos.results {
            result.validate()?;
        }
        Ok(infos)
    }
}

impl ResultInfo {
    /// @ai:intent Grouping key: the benchmark program
    pub fn program(&self) -> &str {
        &self.invocation_info.program
    }

    pub fn is_merged(&self) -> bool {
        self.merged_result
    }

    /// @ai:intent Number of runs this record describes
    pub fn repetitions(&self) -> usize {
        if self.merged_result {
            self.klee_dir.list_len().unwrap_or(1)
        } else {
            1
        }
    }

    /// @ai:intent Check that per-repetition lists agree in length and single results hold scalars
    /// @ai:effects pure
    pub fn validate(&self) -> Result<()> {
        let inconsistent = |message: String| Error::InconsistentResultInfo {
            program: self.program().to_string(),
            message,
        };

        let lengths = [
            ("exit_code", self.exit_code.list_len()),
            ("out_of_memory", self.out_of_memory.list_len()),
            ("backend_timeout", self.backend_timeout.list_len()),
            ("klee_dir", self.klee_dir.list_len()),
            ("user_cpu_time", self.user_cpu_time.list_len()),
            ("sys_cpu_time", self.sys_cpu_time.list_len()),
            ("wallclock_time", self.wallclock_time.list_len()),
        ];

        if !self.merged_result {
            if let Some((field, _)) = lengths.iter().find(|(_, len)| len.is_some()) {
                return Err(inconsistent(format!(
                    "\"{field}\" is a list but the result is not merged"
                )));
            }
            return Ok(());
        }

        let Some(repetitions) = self.klee_dir.list_len() else {
            return Err(inconsistent(
                "merged result must list one klee_dir per repetition".to_string(),
            ));
        };
        if repetitions == 0 {
            return Err(inconsistent("merged result has no klee_dir".to_string()));
        }
        for (field, len) in lengths {
            if let Some(len) = len {
                if len != repetitions {
                    return Err(inconsistent(format!(
                        "\"{field}\" has {len} values but there are {repetitions} repetitions"
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn klee_dirs(&self) -> Vec<PathBuf> {
        self.klee_dir.per_repetition(self.repetitions())
    }

    pub fn exit_codes(&self) -> Vec<Option<i32>> {
        self.exit_code.per_repetition(self.repetitions())
    }

    pub fn out_of_memory_flags(&self) -> Vec<bool> {
        self.out_of_memory.per_repetition(self.repetitions())
    }

    pub fn backend_timeouts(&self) -> Vec<bool> {
        self.backend_timeout.per_repetition(self.repetitions())
    }

    /// @ai:intent User plus system CPU time per repetition, `None` if either is missing
    /// @ai:effects pure
    pub fn cpu_times(&self) -> Vec<Option<f64>> {
        let n = self.repetitions();
        self.user_cpu_time
            .per_repetition(n)
            .into_iter()
            .zip(self.sys_cpu_time.per_repetition(n))
            .map(|(user, sys)| Some(user? + sys?))
            .collect()
    }

    pub fn wallclock_times(&self) -> Vec<Option<f64>> {
        self.wallclock_time.per_repetition(self.repetitions())
    }

    /// @ai:intent Repetitions that crashed: non-zero exit code or out of memory
    /// @ai:effects pure
    pub fn crash_count(&self) -> usize {
        self.exit_codes()
            .into_iter()
            .zip(self.out_of_memory_flags())
            .filter(|(code, oom)| code.is_some_and(|c| c != 0) || *oom)
            .count()
    }

    /// @ai:intent Path of the spec file the runner attached to this benchmark
    pub fn augmented_spec_file(&self) -> Result<&Path> {
        self.invocation_info
            .misc
            .augmented_spec_file
            .as_deref()
            .ok_or_else(|| Error::MissingSpecPath(self.program().to_string()))
    }

    /// @ai:effects fs:read
    pub fn load_spec(&self) -> Result<BenchmarkSpec> {
        BenchmarkSpec::load(self.augmented_spec_file()?)
    }

    /// @ai:intent Open the run directory, or a proxy over all repetitions when merged
    /// @ai:effects fs:read
    pub fn open_klee_dir(&self) -> Result<Box<dyn RunDirectory>> {
        if self.merged_result {
            Ok(Box::new(KleeDirProxy::open(&self.klee_dirs())?))
        } else {
            let dirs = self.klee_dirs();
            let path = dirs.first().ok_or_else(|| Error::InconsistentResultInfo {
                program: self.program().to_string(),
                message: "no klee_dir".to_string(),
            })?;
            Ok(Box::new(KleeDir::open(path)?))
        }
    }

    /// @ai:intent Everything notable about how the run(s) went
    /// @ai:effects fs:read
    pub fn run_outcomes(&self) -> Result<(Vec<RunOutcome>, Box<dyn RunDirectory>)> {
        let mut outcomes = Vec::new();

        for code in self.exit_codes().into_iter().flatten() {
            if code != 0 {
                outcomes.push(RunOutcome::BadExit(code));
            }
        }
        for oom in self.out_of_memory_flags() {
            if oom {
                outcomes.push(RunOutcome::OutOfMemory);
            }
        }
        let mut hard_timeout = false;
        for timeout in self.backend_timeouts() {
            if timeout {
                outcomes.push(RunOutcome::OutOfTime(TimeoutKind::Backend));
                hard_timeout = true;
            }
        }

        let dir = self.open_klee_dir()?;
        outcomes.extend(directory_outcomes(&*dir));

        if !hard_timeout && dir.halt_timer_invoked() {
            outcomes.push(RunOutcome::OutOfTime(TimeoutKind::SoftTimeout));
        }
        Ok((outcomes, dir))
    }
}

/// @ai:intent Outcomes readable from the run directory alone
/// @ai:effects pure
pub fn directory_outcomes<D: RunDirectory + ?Sized>(dir: &D) -> Vec<RunOutcome> {
    if !dir.is_valid() {
        return vec![RunOutcome::InvalidKleeDir];
    }

    let mut outcomes = vec![RunOutcome::ValidKleeDir];
    let lost = dir.lost_test_cases();
    if lost > 0 {
        outcomes.push(RunOutcome::LostTestCases(lost));
    }

    let ids = |category: ErrorCategory| -> Vec<u32> {
        dir.errors_of(category)
            .iter()
            .map(|t| t.identifier)
            .collect()
    };
    let execution = ids(ErrorCategory::Execution);
    if !execution.is_empty() {
        outcomes.push(RunOutcome::ExecutionErrors(execution));
    }
    let user = ids(ErrorCategory::User);
    if !user.is_empty() {
        outcomes.push(RunOutcome::UserErrors(user));
    }
    let misc = ids(ErrorCategory::Misc);
    if !misc.is_empty() {
        outcomes.push(RunOutcome::MiscErrors(misc));
    }
    outcomes
}

/// @ai:intent Results of several result-info files lined up by program
#[derive(Debug, Default)]
pub struct GroupedResults<'a> {
    /// program -> one slot per input file, `None` where the file lacks it
    pub by_program: BTreeMap<String, Vec<Option<&'a ResultInfo>>>,
    /// per input file, duplicates that were dropped
    pub rejected: Vec<Vec<&'a ResultInfo>>,
}

impl<'a> GroupedResults<'a> {
    /// @ai:intent (program, file index) pairs with no result
    pub fn missing(&self) -> Vec<(&str, usize)> {
        self.by_program
            .iter()
            .flat_map(|(program, slots)| {
                slots
                    .iter()
                    .enumerate()
                    .filter(|(_, slot)| slot.is_none())
                    .map(move |(index, _)| (program.as_str(), index))
            })
            .collect()
    }

    pub fn has_rejected(&self) -> bool {
        self.rejected.iter().any(|r| !r.is_empty())
    }

    /// @ai:intent Programs present in every file, with their results in file order
    pub fn complete(&self) -> impl Iterator<Item = (&str, Vec<&'a ResultInfo>)> + '_ {
        self.by_program.iter().filter_map(|(program, slots)| {
            slots
                .iter()
                .copied()
                .collect::<Option<Vec<_>>>()
                .map(|results| (program.as_str(), results))
        })
    }
}

/// @ai:intent Line up results from several files by program key
/// @ai:post a program appearing twice in one file keeps its first entry; later ones are rejected
/// @ai:effects pure
pub fn group_result_infos(files: &[ResultInfos]) -> GroupedResults<'_> {
    let mut grouped = GroupedResults {
        by_program: BTreeMap::new(),
        rejected: vec![Vec::new(); files.len()],
    };

    for (index, file) in files.iter().enumerate() {
        for result in &file.results {
            let slots = grouped
                .by_program
                .entry(result.program().to_string())
                .or_insert_with(|| vec![None; files.len()]);
            if slots[index].is_some() {
                tracing::error!(
                    "\"{}\" cannot appear more than once in the same result infos (index {})",
                    result.program(),
                    index
                );
                grouped.rejected[index].push(result);
                continue;
            }
            slots[index] = Some(result);
        }
    }
    grouped
}

/// @ai:intent Coverage numbers for one program, per repetition when merged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageEntry {
    pub branch_coverage: OneOrMany<f64>,
    #[serde(default)]
    pub line_coverage: OneOrMany<f64>,
    #[serde(default)]
    pub raw_data: serde_yaml::Value,
}

/// @ai:intent Coverage-info file: program -> coverage
pub type CoverageInfo = BTreeMap<String, CoverageEntry>;

/// @ai:intent Load a coverage-info YAML file
/// @ai:effects fs:read
pub fn load_coverage_info(path: &Path) -> Result<CoverageInfo> {
    let content = std::fs::read_to_string(path)?;
    let info: CoverageInfo = serde_yaml::from_str(&content).map_err(|source| Error::Yaml {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!("Loaded coverage for {} program(s) from \"{}\"", info.len(), path.display());
    Ok(info)
}
