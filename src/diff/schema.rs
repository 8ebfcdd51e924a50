//! Schema definitions for diff reports.
//!
//! Defines the structures that represent differences between two traces.

use crate::parser::{SpanStatus, SpanType};
use serde::{Deserialize, Serialize};

/// Complete diff report comparing baseline and target traces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceDiffReport {
    /// Schema version for the diff format
    pub diff_version: String,

    /// Timestamp when diff was generated
    pub generated_at: String,

    pub baseline: TraceMetadata,
    pub target: TraceMetadata,

    /// Trace-level aggregate changes
    pub metrics: MetricDeltas,

    /// Span counts per category, union of both sides
    pub categories: Vec<CategoryDelta>,

    /// Largest per-name average duration changes, by magnitude
    pub names: Vec<NameDelta>,

    pub summary: DiffSummary,
}

/// Identifying data of one side of the comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TraceMetadata {
    pub trace_id: String,
    pub name: String,
    pub status: SpanStatus,
}

/// Change in one numeric metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct MetricDelta {
    pub baseline: f64,
    pub target: f64,

    /// Target minus baseline
    pub absolute_change: f64,

    pub percent_change: f64,
}

/// Aggregate metric changes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MetricDeltas {
    pub duration_ms: MetricDelta,
    pub span_count: MetricDelta,
    pub total_tokens: MetricDelta,
    pub total_cost: MetricDelta,
}

/// Change in span count for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryDelta {
    pub span_type: SpanType,

    /// Zero when the category is absent on this side
    pub baseline: u64,
    pub target: u64,

    /// Target minus baseline
    pub delta: i64,

    pub percent_change: f64,
}

/// Change in average duration for spans sharing a name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameDelta {
    pub name: String,
    pub baseline_count: u64,
    pub target_count: u64,

    /// Zero when the name is absent on this side
    pub baseline_avg_ms: f64,
    pub target_avg_ms: f64,

    pub percent_change: f64,
}

/// Direction of a metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increased,
    Decreased,
    Unchanged,
}

impl Trend {
    pub fn of(delta: &MetricDelta) -> Self {
        if delta.absolute_change > 0.0 {
            Trend::Increased
        } else if delta.absolute_change < 0.0 {
            Trend::Decreased
        } else {
            Trend::Unchanged
        }
    }
}

/// Summary of diff results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffSummary {
    pub duration_trend: Trend,
    pub cost_trend: Trend,

    /// Categories whose span count changed
    pub changed_categories: usize,

    /// Optional warning message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}
