//! Trace parsing and schema definitions.
//!
//! This module handles:
//! - Span / trace record shapes
//! - Parsing raw repository JSON into bundles
//! - Validating bundle format

pub mod loader;
pub mod schema;

// Re-export main types
pub use loader::{parse_bundle, parse_bundles, validate_bundle_format};
pub use schema::{millis_between, Span, SpanStatus, SpanType, Trace, TraceBundle};
