//! Metric extraction and delta calculation.
//!
//! Handles the math for computing differences between traces,
//! including the zero-baseline edge cases.

use crate::aggregator::cost::RateTable;
use crate::aggregator::timeline::TimeWindow;
use crate::parser::{SpanType, TraceBundle};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::schema::{CategoryDelta, MetricDelta, MetricDeltas, NameDelta};

/// Signed percent change from `baseline` to `target`
///
/// * both zero: `0`
/// * zero baseline, nonzero target: `100` (a full increase, never infinite)
/// * otherwise: `(target - baseline) / baseline * 100`
pub fn percent_change(baseline: f64, target: f64) -> f64 {
    if baseline == 0.0 {
        if target == 0.0 {
            0.0
        } else {
            100.0
        }
    } else {
        (target - baseline) / baseline * 100.0
    }
}

pub fn metric_delta(baseline: f64, target: f64) -> MetricDelta {
    MetricDelta {
        baseline,
        target,
        absolute_change: target - baseline,
        percent_change: percent_change(baseline, target),
    }
}

/// Aggregate numbers of one trace, as compared by the diff
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceMetrics {
    pub duration_ms: f64,
    pub span_count: u64,
    pub total_tokens: u64,
    pub total_cost: f64,
}

/// Extract comparable metrics from a bundle
///
/// Trace-level aggregates are trusted when present; anything missing is
/// derived from the spans.
pub fn extract_metrics(bundle: &TraceBundle, rates: &RateTable, now: DateTime<Utc>) -> TraceMetrics {
    let trace = &bundle.trace;
    let spans = &bundle.spans;

    let duration_ms = trace.duration_ms.unwrap_or_else(|| {
        TimeWindow::from_spans(spans, now)
            .filter(|w| !w.is_degenerate())
            .map(|w| w.total_ms())
            .unwrap_or(0.0)
    });

    let span_count = if trace.span_count > 0 {
        trace.span_count
    } else {
        spans.len() as u64
    };

    let total_tokens = trace.total_tokens.unwrap_or_else(|| {
        spans
            .iter()
            .filter_map(|s| s.tokens)
            .fold(0u64, u64::saturating_add)
    });

    let total_cost = trace
        .total_cost
        .unwrap_or_else(|| spans.iter().map(|s| rates.span_cost(s)).sum());

    TraceMetrics {
        duration_ms: duration_ms.max(0.0),
        span_count,
        total_tokens,
        total_cost,
    }
}

/// Delta for every aggregate metric
pub fn calculate_metric_deltas(baseline: &TraceMetrics, target: &TraceMetrics) -> MetricDeltas {
    MetricDeltas {
        duration_ms: metric_delta(baseline.duration_ms, target.duration_ms),
        span_count: metric_delta(baseline.span_count as f64, target.span_count as f64),
        total_tokens: metric_delta(baseline.total_tokens as f64, target.total_tokens as f64),
        total_cost: metric_delta(baseline.total_cost, target.total_cost),
    }
}

fn count_categories(bundle: &TraceBundle) -> [u64; SpanType::ALL.len()] {
    let mut counts = [0u64; SpanType::ALL.len()];
    for span in &bundle.spans {
        counts[span.span_type.index()] += 1;
    }
    counts
}

/// Compare span counts per category
///
/// Covers the union of categories present on either side; a category missing
/// from one side counts as zero there.
pub fn compare_categories(baseline: &TraceBundle, target: &TraceBundle) -> Vec<CategoryDelta> {
    let before = count_categories(baseline);
    let after = count_categories(target);

    SpanType::ALL
        .iter()
        .filter(|t| before[t.index()] > 0 || after[t.index()] > 0)
        .map(|&span_type| {
            let (b, a) = (before[span_type.index()], after[span_type.index()]);
            CategoryDelta {
                span_type,
                baseline: b,
                target: a,
                delta: a as i64 - b as i64,
                percent_change: percent_change(b as f64, a as f64),
            }
        })
        .collect()
}

/// (count, summed duration) per span name
fn group_by_name(bundle: &TraceBundle, now: DateTime<Utc>) -> BTreeMap<&str, (u64, f64)> {
    let mut groups: BTreeMap<&str, (u64, f64)> = BTreeMap::new();
    for span in &bundle.spans {
        let entry = groups.entry(span.name.as_str()).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += span.effective_duration_ms(now);
    }
    groups
}

fn mean(group: Option<&(u64, f64)>) -> (u64, f64) {
    match group {
        Some(&(count, sum)) if count > 0 => (count, sum / count as f64),
        _ => (0, 0.0),
    }
}

/// Rank span names by the magnitude of their average duration change
///
/// Returns at most `top_k` entries, largest absolute change first. Names
/// with equal magnitude stay in name order.
pub fn compare_span_names(
    baseline: &TraceBundle,
    target: &TraceBundle,
    now: DateTime<Utc>,
    top_k: usize,
) -> Vec<NameDelta> {
    let before = group_by_name(baseline, now);
    let after = group_by_name(target, now);

    let mut names: Vec<&str> = before.keys().chain(after.keys()).copied().collect();
    names.sort_unstable();
    names.dedup();

    let mut deltas: Vec<NameDelta> = names
        .into_iter()
        .map(|name| {
            let (baseline_count, baseline_avg_ms) = mean(before.get(name));
            let (target_count, target_avg_ms) = mean(after.get(name));
            NameDelta {
                name: name.to_string(),
                baseline_count,
                target_count,
                baseline_avg_ms,
                target_avg_ms,
                percent_change: percent_change(baseline_avg_ms, target_avg_ms),
            }
        })
        .collect();

    deltas.sort_by(|a, b| {
        b.percent_change
            .abs()
            .partial_cmp(&a.percent_change.abs())
            .unwrap_or(Ordering::Equal)
    });
    deltas.truncate(top_k);
    deltas
}

/// Same trace id and same aggregate numbers on both sides
pub fn are_traces_identical(
    baseline: &TraceBundle,
    target: &TraceBundle,
    baseline_metrics: &TraceMetrics,
    target_metrics: &TraceMetrics,
) -> bool {
    baseline.trace.id == target.trace.id && baseline_metrics == target_metrics
}
