//! Vizpath Studio CLI
//!
//! Trace analytics for agent execution traces: span trees, timelines,
//! dependency graphs, cost breakdowns, latency heatmaps and trace diffs.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use vizpath_studio::commands::{
    display_schema, display_version, execute_analyze, execute_diff, execute_export,
    validate_args, validate_bundle_file, AnalyzeArgs, DiffArgs, ExportArgs,
};
use vizpath_studio::output::ExportFormat;

/// Vizpath Studio - trace analytics for agent programs
#[derive(Parser, Debug)]
#[command(name = "vizpath")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze one trace
    Analyze {
        /// Trace bundle JSON ({trace, spans} or a span array)
        #[arg(short, long)]
        input: PathBuf,

        /// Output path for the JSON report (placed in artifacts/ by default)
        #[arg(short, long, default_value = "artifacts/report.json")]
        output: PathBuf,

        /// TOML file with pricing / simulation / report settings
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Bound on force simulation ticks (overrides config)
        #[arg(long)]
        ticks: Option<usize>,

        /// Print text summary to stdout
        #[arg(long)]
        summary: bool,
    },

    /// Compare two traces
    Diff {
        /// Baseline trace JSON
        #[arg(short, long)]
        baseline: PathBuf,

        /// Target trace JSON
        #[arg(short, long)]
        target: PathBuf,

        /// Optional path to write the JSON diff report
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// TOML file with pricing settings
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print a terminal summary (default when no output is given)
        #[arg(long)]
        summary: bool,
    },

    /// Export traces as JSON, JSONL or CSV
    Export {
        /// Trace bundle JSON file(s)
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,

        /// Export format
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Drop span input/output payloads
        #[arg(long)]
        strip_io: bool,
    },

    /// Validate a trace bundle JSON file
    Validate {
        /// Path to trace JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Display schema information
    Schema {
        /// Show full schema details
        #[arg(long)]
        show: bool,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Execute command
    match cli.command {
        Commands::Analyze {
            input,
            output,
            config,
            ticks,
            summary,
        } => {
            let args = AnalyzeArgs {
                input,
                output,
                config,
                ticks,
                print_summary: summary,
            };

            // Validate args first
            validate_args(&args)?;
            execute_analyze(args)?;
        }

        Commands::Diff {
            baseline,
            target,
            output,
            config,
            summary,
        } => {
            let summary = summary || output.is_none();
            execute_diff(DiffArgs {
                baseline,
                target,
                output,
                config,
                summary,
            })?;
        }

        Commands::Export {
            input,
            format,
            output,
            strip_io,
        } => {
            execute_export(ExportArgs {
                inputs: input,
                format,
                output,
                strip_io,
            })?;
        }

        Commands::Validate { file } => {
            validate_bundle_file(file)?;
        }

        Commands::Schema { show } => {
            display_schema(show);
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
