//! Analyze command implementation.
//!
//! The analyze command:
//! 1. Loads configuration
//! 2. Reads the trace bundle
//! 3. Runs every single-trace engine
//! 4. Writes the JSON report

use super::models::AnalyzeArgs;
use super::utils::load_analytics_config;
use crate::aggregator::{analyze_bundle, AnalysisReport};
use crate::output::{read_bundle, validate_output_path, write_report};
use crate::utils::config::MAX_SIMULATION_TICKS;
use anyhow::{Context, Result};
use chrono::Utc;
use log::{debug, info};
use std::time::Instant;

/// Execute the analyze command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Config file unreadable or invalid
/// * Input file missing or not a trace bundle
/// * Report write failure
pub fn execute_analyze(args: AnalyzeArgs) -> Result<AnalysisReport> {
    let start_time = Instant::now();

    info!("Step 1/4: Loading configuration...");
    let mut config = load_analytics_config(args.config.as_deref())?;
    if let Some(ticks) = args.ticks {
        config.simulation.max_ticks = ticks;
    }

    info!("Step 2/4: Reading trace from {}...", args.input.display());
    let bundle = read_bundle(&args.input)
        .with_context(|| format!("Failed to read trace bundle {}", args.input.display()))?;

    info!("Step 3/4: Analyzing {} spans...", bundle.spans.len());
    let report = analyze_bundle(&bundle, &config, Utc::now());

    debug!("Top cost categories:");
    for category in report.costs.categories.iter().take(3) {
        debug!(
            "  {}: {} spans, {} tokens, ${:.4}",
            category.span_type, category.count, category.tokens, category.cost
        );
    }

    info!("Step 4/4: Writing report...");
    write_report(&report, &args.output).context("Failed to write analysis report")?;
    info!("✓ Report written to: {}", args.output.display());

    if args.print_summary {
        println!("{}", render_summary(&report));
    }

    info!(
        "Analysis completed in {:.2}s",
        start_time.elapsed().as_secs_f64()
    );

    Ok(report)
}

/// Validate analyze arguments
///
/// **Public** - can be called before execute_analyze for early validation
pub fn validate_args(args: &AnalyzeArgs) -> Result<()> {
    if args.input.as_os_str().is_empty() {
        anyhow::bail!("Input path cannot be empty");
    }

    if !args.input.exists() {
        anyhow::bail!("Input file does not exist: {}", args.input.display());
    }

    validate_output_path(&args.output).context("Invalid output path")?;

    if let Some(ticks) = args.ticks {
        if ticks > MAX_SIMULATION_TICKS {
            anyhow::bail!("ticks is too large (max {})", MAX_SIMULATION_TICKS);
        }
    }

    Ok(())
}

/// Plain-text report summary
fn render_summary(report: &AnalysisReport) -> String {
    let s = &report.summary;
    let mut out = String::new();

    out.push_str(&format!("\n{}\n", "=".repeat(80)));
    out.push_str("TRACE SUMMARY\n");
    out.push_str(&format!("{}\n", "=".repeat(80)));
    out.push_str(&format!("Trace:     {} ({})\n", s.trace_id, s.name));
    out.push_str(&format!("Status:    {}\n", s.status));
    out.push_str(&format!(
        "Spans:     {} ({} roots, max depth {}, {} errors)\n",
        s.span_count, s.root_count, s.max_depth, s.error_count
    ));
    out.push_str(&format!("Duration:  {:.1}ms\n", s.duration_ms));
    out.push_str(&format!("Tokens:    {}\n", s.total_tokens));
    out.push_str(&format!(
        "Cost:      ${:.4} ({:?})\n",
        report.costs.total_cost, report.costs.cost_source
    ));

    if !report.costs.categories.is_empty() {
        out.push_str("\nBy category:\n");
        for c in &report.costs.categories {
            out.push_str(&format!(
                "  {:<10} {:>4} spans {:>8} tokens  ${:.4}\n",
                c.span_type.as_str(),
                c.count,
                c.tokens,
                c.cost
            ));
        }
    }

    if !report.heatmap.summaries.is_empty() {
        out.push_str("\nLatency:\n");
        for l in &report.heatmap.summaries {
            out.push_str(&format!(
                "  {:<10} mean {:>9.1}ms  max {:>9.1}ms\n",
                l.span_type.as_str(),
                l.mean_ms,
                l.max_ms
            ));
        }
    }

    out.push_str(&"=".repeat(80));
    out
}
