//! @ai:module:intent CLI entry point that parses and summarizes KLEE run directories
//! @ai:module:layer presentation
//! @ai:module:public_api main
//! @ai:module:depends_on dir, proxy, output

use clap::{Parser, ValueEnum};
use kleedir::{output, KleeDir, KleeDirProxy, OutputFormat};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "show-klee-dir")]
#[command(author, version, about = "Show a summary of one or more KLEE output directories")]
struct Cli {
    /// KLEE output directories; several are treated as repeated runs of one benchmark
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// List the location of every error test case
    #[arg(long)]
    show_error_locations: bool,

    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    format: Format,

    /// Enable debug logging
    #[arg(long, short)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
    JsonPretty,
}

impl From<Format> for OutputFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
            Format::JsonPretty => OutputFormat::JsonPretty,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let directive = if cli.verbose { "kleedir=debug" } else { "kleedir=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(directive)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(2)
        }
    }
}

/// @ai:intent Summarize the requested directories and print the summary
/// @ai:post Ok(false) when the (merged) run directory is invalid
fn run(cli: &Cli) -> kleedir::Result<bool> {
    let summary = if cli.paths.len() == 1 {
        output::summarize(&KleeDir::open(&cli.paths[0])?)
    } else {
        output::summarize(&KleeDirProxy::open(&cli.paths)?)
    };

    let formatted = output::format_summary(&summary, cli.format.into(), cli.show_error_locations)?;
    println!("{}", formatted);
    Ok(summary.valid)
}
