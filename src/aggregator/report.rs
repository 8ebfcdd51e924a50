//! Single-trace analysis report.
//!
//! Runs every single-trace engine over one bundle and collects the results
//! into one serializable document, the shape `analyze` writes to disk.

use super::cost::{analyze_costs_top_k, CostBreakdown, RateTable};
use super::heatmap::{build_heatmap, Heatmap};
use super::timeline::{layout_timeline, TimelineLayout};
use super::tree_builder::{SpanArena, SpanNode};
use crate::graph::{graph_from_arena, settle_layout, NodePosition, SpanGraph};
use crate::parser::{SpanStatus, TraceBundle};
use crate::utils::config::{AnalyticsConfig, SCHEMA_VERSION};
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};

/// Headline numbers for one trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceSummary {
    pub trace_id: String,
    pub name: String,
    pub status: SpanStatus,
    pub span_count: usize,
    pub root_count: usize,
    pub max_depth: usize,
    pub error_count: usize,
    pub total_tokens: u64,

    /// Wall-clock length of the span window
    pub duration_ms: f64,
}

/// Graph plus the positions the force simulation settled on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphLayout {
    #[serde(flatten)]
    pub graph: SpanGraph,
    pub positions: Vec<NodePosition>,

    /// Ticks actually run before settling or hitting the bound
    pub ticks: usize,
}

/// Everything derived from one trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub version: String,
    pub generated_at: String,
    pub summary: TraceSummary,
    pub tree: Vec<SpanNode>,
    pub timeline: TimelineLayout,
    pub graph: GraphLayout,
    pub costs: CostBreakdown,
    pub heatmap: Heatmap,
}

/// Analyze one trace bundle
///
/// **Public** - main entry point for single-trace analysis
///
/// # Arguments
/// * `bundle` - Trace and its flat span set
/// * `config` - Pricing, simulation and report settings
/// * `now` - Instant used for every running span in this pass
///
/// # Returns
/// The full report; an empty span set yields an empty, zero-valued report
pub fn analyze_bundle(
    bundle: &TraceBundle,
    config: &AnalyticsConfig,
    now: DateTime<Utc>,
) -> AnalysisReport {
    let spans = &bundle.spans;
    info!("Analyzing trace {} ({} spans)", bundle.trace.id, spans.len());

    let arena = SpanArena::build(spans);
    let tree = arena.to_nodes();
    let timeline = layout_timeline(spans, now);

    let rates = RateTable::from_config(&config.pricing);
    let costs = analyze_costs_top_k(
        spans,
        bundle.trace.total_cost,
        &rates,
        now,
        config.report.top_cost_spans,
    );
    let heatmap = build_heatmap(spans, now);

    let graph = graph_from_arena(&arena);
    let (positions, ticks) = settle_layout(&graph, &config.simulation);

    let summary = TraceSummary {
        trace_id: bundle.trace.id.clone(),
        name: bundle.trace.name.clone(),
        status: bundle.trace.status,
        span_count: spans.len(),
        root_count: arena.roots().len(),
        max_depth: arena.max_depth(),
        error_count: spans.iter().filter(|s| s.is_error()).count(),
        total_tokens: costs.total_tokens,
        duration_ms: timeline.total_duration_ms,
    };

    AnalysisReport {
        version: SCHEMA_VERSION.to_string(),
        generated_at: now.to_rfc3339(),
        summary,
        tree,
        timeline,
        graph: GraphLayout {
            graph,
            positions,
            ticks,
        },
        costs,
        heatmap,
    }
}
