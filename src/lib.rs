//! Vizpath Studio
//!
//! Trace analytics for agent execution traces.
//!
//! This crate turns a flat, unordered set of span records into a
//! parent-child forest, a timeline layout, a dependency graph with a
//! force-directed layout, cost and latency aggregates, and trace diffs.
//! It also provides the `vizpath` CLI.
//!
//! ## Getting Started
//!
//! ```bash
//! vizpath analyze --input trace.json --summary
//! vizpath diff --baseline a.json --target b.json
//! ```
//!
//! ```ignore
//! use vizpath_studio::aggregator::analyze_bundle;
//! use vizpath_studio::output::read_bundle;
//! use vizpath_studio::utils::config::AnalyticsConfig;
//!
//! let bundle = read_bundle("trace.json")?;
//! let report = analyze_bundle(&bundle, &AnalyticsConfig::default(), chrono::Utc::now());
//! ```

pub mod aggregator;
pub mod commands;
pub mod diff;
pub mod graph;
pub mod output;
pub mod parser;
pub mod utils;
