//! Terminal output rendering for diff reports.
//!
//! Provides human-readable summaries of trace comparisons
//! with visual cues (emojis) for slowdowns and speedups.

use super::schema::{MetricDelta, TraceDiffReport, Trend};
use colored::*;

/// Render a human-readable summary of a diff report for the terminal
pub fn render_terminal_diff(report: &TraceDiffReport) -> String {
    let mut out = String::new();

    out.push_str(&render_header(report));
    out.push_str(&render_metrics(report));
    out.push_str(&render_categories(report));
    out.push_str(&render_names(report));
    out.push_str(&render_status(report));

    out
}

fn render_header(report: &TraceDiffReport) -> String {
    let mut out = String::new();
    out.push_str("\n📊 ");
    out.push_str(&"Trace Comparison Summary".bold().to_string());
    out.push_str("\n---------------------------------------------------\n");
    out.push_str(&format!(
        "Baseline: {} ({})\n",
        report.baseline.trace_id, report.baseline.name
    ));
    out.push_str(&format!(
        "Target:   {} ({})\n",
        report.target.trace_id, report.target.name
    ));
    out.push_str("---------------------------------------------------\n\n");
    out
}

fn render_metric(label: &str, delta: &MetricDelta, precision: usize) -> String {
    format!(
        "{} {}: {:.p$} -> {:.p$} ({:+.2}%)\n",
        delta_symbol(delta.absolute_change),
        label,
        delta.baseline,
        delta.target,
        delta.percent_change,
        p = precision
    )
}

fn render_metrics(report: &TraceDiffReport) -> String {
    let m = &report.metrics;
    let mut out = String::new();
    out.push_str(&render_metric("Duration (ms)", &m.duration_ms, 1));
    out.push_str(&render_metric("Spans", &m.span_count, 0));
    out.push_str(&render_metric("Tokens", &m.total_tokens, 0));
    out.push_str(&render_metric("Cost (USD)", &m.total_cost, 4));
    out
}

fn render_categories(report: &TraceDiffReport) -> String {
    let mut out = String::new();
    let changed: Vec<_> = report.categories.iter().filter(|c| c.delta != 0).collect();

    if !changed.is_empty() {
        out.push_str("\nSpan Count Changes:\n");
        for change in changed {
            out.push_str(&format!(
                "  {} {}: {} -> {} ({:+})\n",
                delta_symbol(change.delta as f64),
                change.span_type,
                change.baseline,
                change.target,
                change.delta
            ));
        }
    }
    out
}

fn render_names(report: &TraceDiffReport) -> String {
    let mut out = String::new();

    if !report.names.is_empty() {
        out.push_str("\nLargest Duration Changes:\n");
        for name in &report.names {
            out.push_str(&format!(
                "  {} {}: {:.1}ms -> {:.1}ms ({:+.2}%)\n",
                delta_symbol(name.target_avg_ms - name.baseline_avg_ms),
                name.name,
                name.baseline_avg_ms,
                name.target_avg_ms,
                name.percent_change
            ));
        }
    }
    out
}

fn render_status(report: &TraceDiffReport) -> String {
    let mut out = String::new();
    out.push_str("\n---------------------------------------------------\n");

    if let Some(warning) = &report.summary.warning {
        out.push_str(&format!("⚠️  {}\n", warning).yellow().to_string());
    }

    let status_msg = match report.summary.duration_trend {
        Trend::Increased => "🐢 TARGET IS SLOWER".red().bold(),
        Trend::Decreased => "⚡ TARGET IS FASTER".green().bold(),
        Trend::Unchanged => "➡️  NO DURATION CHANGE".normal().bold(),
    };
    out.push_str(&status_msg.to_string());
    out.push('\n');
    out
}

fn delta_symbol(change: f64) -> &'static str {
    if change > 0.0 {
        "📈"
    } else if change < 0.0 {
        "📉"
    } else {
        "➡️"
    }
}
