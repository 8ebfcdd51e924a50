//! JSON report writer and trace bundle reader.
//!
//! Writes reports to JSON files with proper formatting and loads
//! trace bundles from repository JSON.

use crate::parser::{parse_bundle, parse_bundles, TraceBundle};
use crate::utils::error::OutputError;
use log::{debug, info};
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Write any serializable report to a JSON file
///
/// **Public** - main entry point for JSON output
///
/// # Arguments
/// * `report` - Analysis or diff report to write
/// * `output_path` - Path to output JSON file
///
/// # Errors
/// * `OutputError::Io` - I/O error during write
/// * `OutputError::SerializationFailed` - JSON serialization error
/// * `OutputError::InvalidPath` - Path cannot be created or is invalid
///
/// # Example
/// ```ignore
/// let report = analyze_bundle(&bundle, &config, Utc::now());
/// write_report(&report, "report.json")?;
/// ```
pub fn write_report<T: Serialize>(
    report: &T,
    output_path: impl AsRef<Path>,
) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    info!("Writing report to: {}", output_path.display());

    let file = create_output_file(output_path)?;
    let writer = BufWriter::new(file);

    serde_json::to_writer_pretty(writer, report)?;

    info!(
        "Report written successfully ({} bytes)",
        calculate_file_size(output_path)
    );

    Ok(())
}

/// Validate the path, create parent directories, and open the file for writing
///
/// **Public** - shared with the export writers
pub fn create_output_file(output_path: &Path) -> Result<File, OutputError> {
    validate_output_path(output_path)?;

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::InvalidPath(format!(
                    "Cannot create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    Ok(File::create(output_path)?)
}

/// Validate that output path is writable
///
/// **Public** - used by commands for early argument validation
pub fn validate_output_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }

    // Refuse to overwrite a directory
    if path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Parent directory will be created: {}", parent.display());
        }
    }

    Ok(())
}

/// Calculate file size in bytes
///
/// **Private** - internal utility
fn calculate_file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

fn read_json(input_path: &Path) -> Result<serde_json::Value, OutputError> {
    debug!("Reading trace data from: {}", input_path.display());
    let file = File::open(input_path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// Read one trace bundle from a JSON file
///
/// **Public** - used by analyze, diff and validate
///
/// # Errors
/// * `OutputError::Io` - File read error
/// * `OutputError::SerializationFailed` - Not valid JSON
/// * `OutputError::InvalidTrace` - JSON is not a trace bundle
pub fn read_bundle(input_path: impl AsRef<Path>) -> Result<TraceBundle, OutputError> {
    let raw = read_json(input_path.as_ref())?;
    let bundle = parse_bundle(&raw)?;

    debug!(
        "Bundle loaded: trace {}, {} spans",
        bundle.trace.id,
        bundle.spans.len()
    );

    Ok(bundle)
}

/// Read every trace bundle in a JSON file
///
/// Accepts a single bundle, a bare span array, or an array of bundles.
pub fn read_bundles(input_path: impl AsRef<Path>) -> Result<Vec<TraceBundle>, OutputError> {
    let raw = read_json(input_path.as_ref())?;
    Ok(parse_bundles(&raw)?)
}
