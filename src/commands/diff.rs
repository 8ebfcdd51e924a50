//! Diff command implementation.
//! Orchestrates the comparison of two traces and reports deltas.

use super::models::DiffArgs;
use super::utils::load_analytics_config;
use crate::aggregator::RateTable;
use crate::diff::{generate_trace_diff_top_k, render_terminal_diff, TraceDiffReport};
use crate::output::{read_bundle, write_report};
use anyhow::{Context, Result};
use chrono::Utc;
use colored::*;

/// Execute the diff command
pub fn execute_diff(args: DiffArgs) -> Result<TraceDiffReport> {
    // Step 1: Load config and traces
    let config = load_analytics_config(args.config.as_deref())?;
    let baseline = read_bundle(&args.baseline).context("Failed to read baseline trace")?;
    let target = read_bundle(&args.target).context("Failed to read target trace")?;

    // Step 2: Generate diff
    let rates = RateTable::from_config(&config.pricing);
    let report = generate_trace_diff_top_k(
        &baseline,
        &target,
        &rates,
        Utc::now(),
        config.report.top_name_diffs,
    );

    // Step 3: Write output if requested
    if let Some(path) = &args.output {
        write_report(&report, path).context("Failed to write diff report JSON")?;
        println!(
            "📊 Diff report written to {}",
            path.display().to_string().cyan()
        );
    }

    // Step 4: Terminal summary
    if args.summary {
        println!("{}", render_terminal_diff(&report));
    }

    Ok(report)
}
