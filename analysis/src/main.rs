//! @ai:module:intent CLI for verifying and ranking KLEE runs
//! @ai:module:layer presentation

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kleedir::RunDirectory;
use klee_analysis::{
    config::AnalysisConfig,
    metrics::{BenchmarkRanking, BenchmarkReport, MetricsAggregator, MetricsAggregatorTrait, TaskReport},
    rank::{rank, RankCandidate, Sample},
    report::ReportGenerator,
    result_info::{group_result_infos, load_coverage_info, CoverageInfo, ResultInfo, ResultInfos},
    spec::match_against_spec,
    verification::{classify, summarize_across_tasks},
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "klee-analysis")]
#[command(about = "Verification verdicts, spec matching and ranking for KLEE runs")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify every task of every result and match it against its spec
    Verify {
        /// Result-info YAML file
        result_info: PathBuf,

        /// Classify runs with a missing or truncated info file
        #[arg(long)]
        allow_invalid: bool,

        /// Only benchmarks carrying all these categories (comma-separated)
        #[arg(long)]
        categories: Option<String>,

        /// Output directory for reports
        #[arg(short, long, default_value = "reports")]
        output: PathBuf,
    },

    /// Rank two result-info files benchmark by benchmark
    Rank {
        /// The two result-info YAML files to compare
        #[arg(num_args = 2, required = true)]
        result_infos: Vec<PathBuf>,

        /// Coverage-info YAML files, one per result-info file
        #[arg(long, num_args = 2)]
        coverage_info: Option<Vec<PathBuf>>,

        /// Only benchmarks carrying all these categories (comma-separated)
        #[arg(long)]
        categories: Option<String>,

        /// Clamp execution times to this many seconds
        #[arg(long)]
        max_exec_time: Option<f64>,

        /// Classify runs with a missing or truncated info file
        #[arg(long)]
        allow_invalid: bool,

        /// Output directory for reports
        #[arg(short, long, default_value = "reports")]
        output: PathBuf,
    },

    /// Print the run outcomes of every result
    Show {
        /// Result-info YAML file
        result_info: PathBuf,
    },

    /// Initialize default configuration
    Init {
        /// Output path for config file
        #[arg(short, long, default_value = "klee-analysis.toml")]
        output: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let directive = if cli.verbose {
        "klee_analysis=debug,kleedir=debug"
    } else {
        "klee_analysis=info,kleedir=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(directive)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

/// @ai:intent Dispatch a subcommand
/// @ai:post Ok(false) when the run completed but found mismatches or problems
fn run(cli: Cli) -> Result<bool> {
    match cli.command {
        Commands::Verify {
            result_info,
            allow_invalid,
            categories,
            output,
        } => {
            let mut config = load_or_default_config(cli.config)?;
            config.verify.allow_invalid_klee_dir |= allow_invalid;
            if let Some(categories) = categories {
                config.filter.categories = split_list(&categories);
            }
            verify(&config, &result_info, &output)
        }
        Commands::Rank {
            result_infos,
            coverage_info,
            categories,
            max_exec_time,
            allow_invalid,
            output,
        } => {
            let mut config = load_or_default_config(cli.config)?;
            config.verify.allow_invalid_klee_dir |= allow_invalid;
            if let Some(categories) = categories {
                config.filter.categories = split_list(&categories);
            }
            if max_exec_time.is_some() {
                config.rank.max_exec_time = max_exec_time;
            }
            config.validate()?;
            rank_files(&config, &result_infos, coverage_info.as_deref(), &output)
        }
        Commands::Show { result_info } => show(&result_info),
        Commands::Init { output } => init_config(output),
    }
}

/// @ai:intent Verify every result of one result-info file
/// @ai:effects fs:read, fs:write
fn verify(config: &AnalysisConfig, path: &Path, output: &Path) -> Result<bool> {
    let infos = ResultInfos::load(path)
        .with_context(|| format!("Failed to load result info from {}", path.display()))?;

    let allow_invalid = config.verify.allow_invalid_klee_dir;
    let mut benchmarks = Vec::new();
    let mut skipped = Vec::new();

    for result in &infos.results {
        let spec = result
            .load_spec()
            .with_context(|| format!("Failed to load spec for {}", result.program()))?;
        if !config.filter.matches(&spec) {
            tracing::debug!("Skipping {} (category filter)", result.program());
            skipped.push(result.program().to_string());
            continue;
        }

        let (outcomes, dir) = result
            .run_outcomes()
            .with_context(|| format!("Failed to read KLEE directory for {}", result.program()))?;

        let verdicts: Vec<_> = config
            .verify
            .selected_tasks()
            .into_iter()
            .map(|task| classify(task, &*dir, allow_invalid))
            .collect();
        let overall = summarize_across_tasks(&verdicts)?;

        let tasks = verdicts
            .iter()
            .map(|verdict| match spec.task(verdict.task()) {
                Ok(task_spec) => TaskReport::new(verdict, Some(&match_against_spec(verdict, task_spec))),
                Err(e) => {
                    tracing::warn!("{}: {}", result.program(), e);
                    TaskReport::new(verdict, None)
                }
            })
            .collect();

        benchmarks.push(BenchmarkReport {
            program: result.program().to_string(),
            spec_name: Some(spec.name.clone()),
            klee_dirs: result
                .klee_dirs()
                .iter()
                .map(|d| d.display().to_string())
                .collect(),
            outcomes,
            overall,
            tasks,
        });
    }

    let aggregator = MetricsAggregator::new();
    let mut results = aggregator.aggregate_verification(
        benchmarks,
        &path.display().to_string(),
        allow_invalid,
    );
    results.skipped = skipped;

    ReportGenerator::new().generate_verification(&results, output)?;

    let mismatches: usize = results.by_task.iter().map(|s| s.matches.mismatched).sum();
    println!(
        "Benchmarks: {} (correct {}, incorrect {}, unknown {}), skipped {}",
        results.benchmarks.len(),
        results.overall.correct,
        results.overall.incorrect,
        results.overall.unknown,
        results.skipped.len()
    );
    for stats in &results.by_task {
        println!(
            "  {:<36} match {:>4}  mismatch {:>4}  unknown {:>4}  FP {:>4}  TP {:>4}",
            stats.task.as_str(),
            stats.matches.matched,
            stats.matches.mismatched,
            stats.matches.unknown,
            stats.matches.false_positives,
            stats.matches.true_positives
        );
    }
    if mismatches > 0 {
        tracing::warn!("{} task(s) did not match their spec", mismatches);
    }
    Ok(mismatches == 0)
}

/// @ai:intent Rank two result-info files benchmark by benchmark and tally wins
/// @ai:effects fs:read, fs:write
fn rank_files(
    config: &AnalysisConfig,
    paths: &[PathBuf],
    coverage_paths: Option<&[PathBuf]>,
    output: &Path,
) -> Result<bool> {
    for (i, a) in paths.iter().enumerate() {
        for b in &paths[i + 1..] {
            if a == b {
                anyhow::bail!("Cannot compare {} with itself", a.display());
            }
        }
    }

    let files = paths
        .iter()
        .map(|p| {
            ResultInfos::load(p)
                .with_context(|| format!("Failed to load result info from {}", p.display()))
        })
        .collect::<Result<Vec<_>>>()?;
    let coverage = coverage_paths
        .map(|paths| {
            paths
                .iter()
                .map(|p| {
                    load_coverage_info(p)
                        .map(|info| (p.clone(), info))
                        .with_context(|| format!("Failed to load coverage info from {}", p.display()))
                })
                .collect::<Result<Vec<_>>>()
        })
        .transpose()?;

    let grouped = group_result_infos(&files);
    if grouped.has_rejected() {
        anyhow::bail!("Duplicate programs in result info files");
    }
    let missing = grouped.missing();
    for (program, index) in &missing {
        tracing::warn!("{} is missing from {}", program, paths[*index].display());
    }

    let allow_invalid = config.verify.allow_invalid_klee_dir;
    let options = config.rank.options();
    let mut rankings = Vec::new();
    let mut skipped = Vec::new();

    for (program, results) in grouped.complete() {
        let spec = results[0]
            .load_spec()
            .with_context(|| format!("Failed to load spec for {}", program))?;
        if !config.filter.matches(&spec) {
            tracing::debug!("Skipping {} (category filter)", program);
            skipped.push(program.to_string());
            continue;
        }

        let candidates = results
            .iter()
            .map(|r| RankCandidate::from_result_info(r, &spec, allow_invalid))
            .collect::<klee_analysis::Result<Vec<_>>>()
            .with_context(|| format!("Failed to build ranking inputs for {}", program))?;
        let samples = coverage
            .as_deref()
            .and_then(|coverage| coverage_samples(coverage, program));

        let positions = rank(&candidates, samples.as_deref(), &options)
            .with_context(|| format!("Failed to rank {}", program))?;
        tracing::debug!("{}: {} position(s)", program, positions.len());
        rankings.push(BenchmarkRanking {
            program: program.to_string(),
            positions,
        });
    }

    let names: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
    let aggregator = MetricsAggregator::new();
    let mut results = aggregator.aggregate_ranking(rankings, &names);
    results.skipped = skipped;

    ReportGenerator::new().generate_ranking(&results, output)?;

    println!("Benchmarks ranked: {}", results.benchmarks.len());
    for (index, stats) in results.wins.iter().enumerate() {
        println!("  [{}] {}: {} win(s)", index, stats.name, stats.wins);
        for (kind, count) in &stats.reasons {
            println!("        {}: {}", kind, count);
        }
    }
    println!("  ties: {}", results.ties);
    for (kind, count) in &results.tie_reasons {
        println!("        {}: {}", kind, count);
    }
    Ok(missing.is_empty())
}

/// @ai:intent Branch coverage samples for one program, if every file has them
/// @ai:post None (with a warning) when any coverage file lacks the program
fn coverage_samples(coverage: &[(PathBuf, CoverageInfo)], program: &str) -> Option<Vec<Sample>> {
    coverage
        .iter()
        .map(|(path, info)| {
            let entry = info.get(program);
            if entry.is_none() {
                tracing::warn!(
                    "{} has no coverage in {}; ranking it without coverage",
                    program,
                    path.display()
                );
            }
            entry.map(|entry| Sample::from(&entry.branch_coverage))
        })
        .collect()
}

/// @ai:intent Print run outcomes for every result in a file
/// @ai:effects fs:read
fn show(path: &Path) -> Result<bool> {
    let infos = ResultInfos::load(path)
        .with_context(|| format!("Failed to load result info from {}", path.display()))?;
    let mut all_valid = true;

    for result in &infos.results {
        print_outcomes(result, &mut all_valid)?;
    }
    Ok(all_valid)
}

/// @ai:effects fs:read
fn print_outcomes(result: &ResultInfo, all_valid: &mut bool) -> Result<()> {
    let (outcomes, dir) = result
        .run_outcomes()
        .with_context(|| format!("Failed to read KLEE directory for {}", result.program()))?;
    *all_valid &= dir.is_valid();

    println!("{} ({} run(s))", result.program(), result.repetitions());
    for outcome in &outcomes {
        println!("  - {}", outcome);
    }
    Ok(())
}

/// @ai:intent Initialize default configuration file
/// @ai:effects fs:write
fn init_config(output: PathBuf) -> Result<bool> {
    let config = AnalysisConfig::default();
    config.save(&output)?;
    println!("Configuration saved to {}", output.display());
    Ok(true)
}

/// @ai:intent Load configuration or use defaults
/// @ai:effects fs:read
fn load_or_default_config(path: Option<PathBuf>) -> Result<AnalysisConfig> {
    match path {
        Some(p) => AnalysisConfig::load(&p)
            .with_context(|| format!("Failed to load config from {}", p.display())),
        None => {
            let default_path = PathBuf::from("klee-analysis.toml");
            if default_path.exists() {
                AnalysisConfig::load(&default_path)
            } else {
                Ok(AnalysisConfig::default())
            }
        }
    }
}

/// @ai:effects pure
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
