//! Single-trace analytics over a flat span set.
//!
//! This module turns parsed spans into:
//! - The parent-child forest (arena-backed)
//! - Timeline bar placement
//! - Token / cost breakdown by category
//! - Latency heatmap
//! - A combined analysis report

pub mod cost;
pub mod heatmap;
pub mod report;
pub mod timeline;
pub mod tree_builder;

// Re-export main types and functions
pub use cost::{
    analyze_costs, analyze_costs_top_k, estimate_cost, CategoryCost, CostBreakdown, CostSource,
    RateTable, SpanCost,
};
pub use heatmap::{build_heatmap, CategoryLatency, DurationBucket, Heatmap, HeatmapRow};
pub use report::{analyze_bundle, AnalysisReport, GraphLayout, TraceSummary};
pub use timeline::{bar_width, layout_timeline, TimeWindow, TimelineBar, TimelineLayout};
pub use tree_builder::{build_span_tree, flatten_forest, SpanArena, SpanNode};
