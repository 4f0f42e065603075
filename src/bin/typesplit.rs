//! typesplit: Split a JSON resource list into one CSV file per type
//!
//! Usage:
//!   # Write one CSV per declared type into ./out
//!   typesplit inventory.json ./out
//!
//!   # Classify on a different field and print a JSON summary
//!   typesplit --types-field kind --summary inventory.json ./out
//!
//! Diagnostics go to stderr (filter with RUST_LOG), written files to stdout.

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;
use typesplit::{convert, ConvertConfig, RunSummary};

#[derive(Parser, Debug)]
#[command(name = "typesplit", version)]
#[command(about = "Convert a JSON resource list into one CSV file per type", long_about = None)]
struct Args {
    /// Input JSON file with a top-level resources array
    #[arg(value_name = "INPUT_JSON_FILE")]
    input: PathBuf,

    /// Directory for the CSV files (created if missing)
    #[arg(value_name = "OUTPUT_DIRECTORY")]
    output_dir: PathBuf,

    /// Top-level field holding the resources array (default: "resources")
    #[arg(long)]
    resources_field: Option<String>,

    /// Per-resource field declaring its type(s) (default: "types")
    #[arg(long)]
    types_field: Option<String>,

    /// Per-resource field used to identify records in warnings (default: "id")
    #[arg(long)]
    id_field: Option<String>,

    /// Maximum nesting depth of a resource, 0 for unlimited (default: unlimited)
    #[arg(long)]
    max_depth: Option<usize>,

    /// Log per-record detail
    #[arg(long, short = 'v', conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(long, short = 'q')]
    quiet: bool,

    /// Print a JSON summary of the run to stdout when done
    #[arg(long)]
    summary: bool,
}

impl Args {
    fn config(&self) -> ConvertConfig {
        let mut config = ConvertConfig::default();
        if let Some(field) = &self.resources_field {
            config.resources_field = field.clone();
        }
        if let Some(field) = &self.types_field {
            config.types_field = field.clone();
        }
        if let Some(field) = &self.id_field {
            config.id_field = field.clone();
        }
        if let Some(depth) = self.max_depth {
            config.max_depth = (depth > 0).then_some(depth);
        }
        config
    }
}

fn init_logging(args: &Args) {
    let default_level = if args.verbose {
        "debug"
    } else if args.quiet {
        "warn"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .init();
}

fn print_summary(summary: &RunSummary) -> Result<()> {
    let json = serde_json::to_string_pretty(summary).context("Failed to serialize run summary")?;
    println!("{}", json);
    Ok(())
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            // Usage errors go to stderr with status 1; --help/--version to stdout with 0
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    init_logging(&args);

    let config = args.config();
    let mut stdout = std::io::stdout().lock();
    let summary = match convert(&args.input, &args.output_dir, &config, &mut stdout) {
        Ok(summary) => summary,
        Err(err) => {
            error!("fatal: {}", err);
            return ExitCode::from(1);
        }
    };
    drop(stdout);

    if args.summary {
        if let Err(err) = print_summary(&summary) {
            error!("{:#}", err);
        }
    }

    ExitCode::SUCCESS
}
