//! Core diff engine implementation.
//! Generates complete diff reports by comparing two traces.

use crate::aggregator::cost::RateTable;
use crate::parser::TraceBundle;
use crate::utils::config::{SCHEMA_VERSION, TOP_NAME_DIFFS};
use chrono::{DateTime, Utc};
use log::debug;

use super::normalizer::{
    are_traces_identical, calculate_metric_deltas, compare_categories, compare_span_names,
    extract_metrics,
};
use super::schema::{DiffSummary, TraceDiffReport, TraceMetadata, Trend};

/// Generate a complete diff report comparing two traces
///
/// # Arguments
/// * `baseline` - The trace to compare against
/// * `target` - The trace to compare
/// * `rates` - Price table for spans without a recorded cost
/// * `now` - Instant used for running spans on both sides
///
/// # Returns
/// Complete TraceDiffReport with all deltas calculated
///
/// # Example
/// ```ignore
/// use vizpath_studio::diff::generate_trace_diff;
/// use vizpath_studio::output::read_bundle;
///
/// let baseline = read_bundle("baseline.json")?;
/// let target = read_bundle("target.json")?;
/// let diff = generate_trace_diff(&baseline, &target, &RateTable::default(), Utc::now());
/// ```
pub fn generate_trace_diff(
    baseline: &TraceBundle,
    target: &TraceBundle,
    rates: &RateTable,
    now: DateTime<Utc>,
) -> TraceDiffReport {
    generate_trace_diff_top_k(baseline, target, rates, now, TOP_NAME_DIFFS)
}

/// `generate_trace_diff` with a configurable number of ranked names
pub fn generate_trace_diff_top_k(
    baseline: &TraceBundle,
    target: &TraceBundle,
    rates: &RateTable,
    now: DateTime<Utc>,
    top_k: usize,
) -> TraceDiffReport {
    debug!(
        "Diffing trace {} against {}",
        target.trace.id, baseline.trace.id
    );

    let baseline_metrics = extract_metrics(baseline, rates, now);
    let target_metrics = extract_metrics(target, rates, now);

    let metrics = calculate_metric_deltas(&baseline_metrics, &target_metrics);
    let categories = compare_categories(baseline, target);
    let names = compare_span_names(baseline, target, now, top_k);

    let warning = if are_traces_identical(baseline, target, &baseline_metrics, &target_metrics) {
        Some("Baseline and target traces are identical".to_string())
    } else {
        None
    };

    let summary = DiffSummary {
        duration_trend: Trend::of(&metrics.duration_ms),
        cost_trend: Trend::of(&metrics.total_cost),
        changed_categories: categories.iter().filter(|c| c.delta != 0).count(),
        warning,
    };

    TraceDiffReport {
        diff_version: SCHEMA_VERSION.to_string(),
        generated_at: now.to_rfc3339(),
        baseline: metadata(baseline),
        target: metadata(target),
        metrics,
        categories,
        names,
        summary,
    }
}

fn metadata(bundle: &TraceBundle) -> TraceMetadata {
    TraceMetadata {
        trace_id: bundle.trace.id.clone(),
        name: bundle.trace.name.clone(),
        status: bundle.trace.status,
    }
}
