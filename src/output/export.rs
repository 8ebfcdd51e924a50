//! Trace export writers.
//!
//! Pure format transforms over trace bundles; none of the analytics run here.
//! - `json`: pretty array of `{trace, spans}` bundles
//! - `jsonl`: one compact bundle per line
//! - `csv`: one row per span, flattened columns

use super::json::create_output_file;
use crate::parser::{Span, TraceBundle};
use crate::utils::error::OutputError;
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Jsonl,
    Csv,
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExportFormat::Json => "json",
            ExportFormat::Jsonl => "jsonl",
            ExportFormat::Csv => "csv",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExportOptions {
    /// Drop span `input` / `output` payloads
    pub strip_io: bool,
}

/// Header of the flattened span table
pub const CSV_COLUMNS: [&str; 13] = [
    "trace_id",
    "span_id",
    "parent_id",
    "name",
    "span_type",
    "status",
    "start_time",
    "end_time",
    "duration_ms",
    "tokens",
    "cost",
    "model",
    "error",
];

/// Export bundles to a file
///
/// **Public** - main entry point for the export command
///
/// # Errors
/// * `OutputError::InvalidPath` - Output path is empty or a directory
/// * `OutputError::Io` - Write failure
/// * `OutputError::SerializationFailed` - JSON serialization error
pub fn write_export(
    bundles: &[TraceBundle],
    format: ExportFormat,
    options: ExportOptions,
    output_path: impl AsRef<Path>,
) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();
    info!(
        "Exporting {} trace(s) as {} to: {}",
        bundles.len(),
        format,
        output_path.display()
    );

    let file = create_output_file(output_path)?;
    let mut writer = BufWriter::new(file);
    export_bundles(bundles, format, options, &mut writer)?;
    writer.flush()?;

    Ok(())
}

/// Export bundles to any writer
pub fn export_bundles<W: Write>(
    bundles: &[TraceBundle],
    format: ExportFormat,
    options: ExportOptions,
    mut writer: W,
) -> Result<(), OutputError> {
    let prepared: Vec<TraceBundle>;
    let bundles = if options.strip_io {
        prepared = bundles.iter().map(strip_io).collect();
        &prepared[..]
    } else {
        bundles
    };

    match format {
        ExportFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, bundles)?;
            writeln!(writer)?;
        }
        ExportFormat::Jsonl => {
            for bundle in bundles {
                serde_json::to_writer(&mut writer, bundle)?;
                writeln!(writer)?;
            }
        }
        ExportFormat::Csv => {
            writeln!(writer, "{}", CSV_COLUMNS.join(","))?;
            for span in bundles.iter().flat_map(|b| b.spans.iter()) {
                writeln!(writer, "{}", csv_row(span))?;
            }
        }
    }

    Ok(())
}

fn strip_io(bundle: &TraceBundle) -> TraceBundle {
    let mut bundle = bundle.clone();
    for span in &mut bundle.spans {
        span.input = None;
        span.output = None;
    }
    bundle
}

/// Quote a field when it contains a delimiter, quote or line break
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn csv_row(span: &Span) -> String {
    let fields = [
        span.trace_id.clone(),
        span.id.clone(),
        optional(span.parent_id.as_deref()),
        span.name.clone(),
        span.span_type.to_string(),
        span.status.to_string(),
        span.start_time.to_rfc3339(),
        optional(span.end_time.map(|t| t.to_rfc3339())),
        optional(span.duration_ms),
        optional(span.tokens),
        optional(span.cost),
        optional(span.model()),
        optional(span.error.as_deref()),
    ];

    fields
        .iter()
        .map(|f| csv_field(f))
        .collect::<Vec<_>>()
        .join(",")
}
