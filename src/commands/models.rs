use crate::output::ExportFormat;
use std::path::PathBuf;

/// Arguments for the analyze command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct AnalyzeArgs {
    /// Trace bundle JSON to analyze
    pub input: PathBuf,

    /// Output path for the JSON report
    pub output: PathBuf,

    /// Optional TOML file with pricing / simulation / report settings
    pub config: Option<PathBuf>,

    /// Override for the force simulation tick bound
    pub ticks: Option<usize>,

    /// Print text summary to stdout
    pub print_summary: bool,
}

impl Default for AnalyzeArgs {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            output: PathBuf::from("artifacts/report.json"),
            config: None,
            ticks: None,
            print_summary: false,
        }
    }
}

/// Arguments for the diff command
#[derive(Debug, Clone)]
pub struct DiffArgs {
    /// Path to the baseline trace JSON
    pub baseline: PathBuf,

    /// Path to the target trace JSON
    pub target: PathBuf,

    /// Optional path to write the JSON diff report
    pub output: Option<PathBuf>,

    /// Optional TOML config (pricing for spans without recorded cost)
    pub config: Option<PathBuf>,

    /// Print a terminal summary
    pub summary: bool,
}

/// Arguments for the export command
#[derive(Debug, Clone)]
pub struct ExportArgs {
    /// One or more trace bundle files
    pub inputs: Vec<PathBuf>,

    pub format: ExportFormat,

    pub output: PathBuf,

    /// Drop span input/output payloads
    pub strip_io: bool,
}
