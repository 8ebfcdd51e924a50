//! Trace diff generation.
//!
//! This module compares two traces (baseline vs target) and produces a delta
//! report: aggregate metrics, per-category span counts and the span names
//! whose average duration moved the most.
//!
//! # Example
//! ```ignore
//! use vizpath_studio::diff::{generate_trace_diff, render_terminal_diff};
//! use vizpath_studio::output::read_bundle;
//!
//! let baseline = read_bundle("baseline.json")?;
//! let target = read_bundle("target.json")?;
//! let diff = generate_trace_diff(&baseline, &target, &RateTable::default(), Utc::now());
//! println!("{}", render_terminal_diff(&diff));
//! ```

mod engine;
mod normalizer;
mod output;
mod schema;

// Public API exports
pub use engine::{generate_trace_diff, generate_trace_diff_top_k};
pub use normalizer::{extract_metrics, percent_change, TraceMetrics};
pub use output::render_terminal_diff;
pub use schema::{
    CategoryDelta, DiffSummary, MetricDelta, MetricDeltas, NameDelta, TraceDiffReport,
    TraceMetadata, Trend,
};
