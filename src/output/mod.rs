//! Output writers and input readers.
//!
//! This module handles moving data to and from disk:
//! - JSON reports (analysis and diff)
//! - Trace bundle loading
//! - Trace export (JSON, JSONL, CSV)

pub mod export;
pub mod json;

// Re-export main functions
pub use export::{export_bundles, write_export, ExportFormat, ExportOptions, CSV_COLUMNS};
pub use json::{create_output_file, read_bundle, read_bundles, validate_output_path, write_report};
