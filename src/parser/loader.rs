//! Trace bundle parser.
//!
//! Turns raw repository JSON into a `TraceBundle`. Two shapes are accepted:
//! the trace detail response `{ "trace": {...}, "spans": [...] }`, and a bare
//! array of spans (as posted to the batch ingestion endpoint), in which case
//! the trace aggregates are rolled up from the spans.

use super::schema::{Span, Trace, TraceBundle};
use crate::utils::error::ParseError;
use log::{debug, warn};

/// Parse a trace bundle from raw JSON
///
/// **Public** - main entry point for parsing
///
/// # Errors
/// * `ParseError::JsonError` - A span or trace record has the wrong shape
/// * `ParseError::InvalidFormat` - Top-level structure is not recognised
pub fn parse_bundle(raw: &serde_json::Value) -> Result<TraceBundle, ParseError> {
    validate_bundle_format(raw)?;

    let bundle = match raw {
        serde_json::Value::Array(_) => {
            debug!("Bundle is a bare span array, rolling up trace aggregates");
            let spans: Vec<Span> = serde_json::from_value(raw.clone())?;
            let trace_id = spans
                .first()
                .map(|s| s.trace_id.clone())
                .unwrap_or_default();
            let spans = retain_trace_spans(&trace_id, spans);
            let trace = Trace::from_spans(trace_id, &spans);
            TraceBundle { trace, spans }
        }
        _ => {
            let trace: Trace = serde_json::from_value(raw["trace"].clone())?;
            let spans: Vec<Span> = match raw.get("spans") {
                Some(value) if !value.is_null() => serde_json::from_value(value.clone())?,
                _ => Vec::new(),
            };
            let spans = retain_trace_spans(&trace.id, spans);
            TraceBundle { trace, spans }
        }
    };

    debug!(
        "Parsed trace {} with {} spans",
        bundle.trace.id,
        bundle.spans.len()
    );

    Ok(bundle)
}

/// Parse every bundle found in a JSON document
///
/// Accepts a single bundle, a bare span array, or an array of bundles
/// (the shape `export --format json` writes).
pub fn parse_bundles(raw: &serde_json::Value) -> Result<Vec<TraceBundle>, ParseError> {
    match raw {
        serde_json::Value::Array(items) if items.iter().any(|i| i.get("trace").is_some()) => {
            items.iter().map(parse_bundle).collect()
        }
        _ => Ok(vec![parse_bundle(raw)?]),
    }
}

/// Check the top-level structure before deserializing
///
/// **Public** - used by the validate command
pub fn validate_bundle_format(raw: &serde_json::Value) -> Result<(), ParseError> {
    match raw {
        serde_json::Value::Array(_) => Ok(()),
        serde_json::Value::Object(obj) => {
            if !obj.contains_key("trace") {
                return Err(ParseError::InvalidFormat(
                    "expected a \"trace\" object or an array of spans".to_string(),
                ));
            }
            match obj.get("spans") {
                None | Some(serde_json::Value::Null) | Some(serde_json::Value::Array(_)) => Ok(()),
                Some(_) => Err(ParseError::InvalidFormat(
                    "\"spans\" must be an array".to_string(),
                )),
            }
        }
        _ => Err(ParseError::InvalidFormat(
            "trace data must be a JSON object or array".to_string(),
        )),
    }
}

/// Drop spans that belong to another trace; parent links are trace-scoped
fn retain_trace_spans(trace_id: &str, spans: Vec<Span>) -> Vec<Span> {
    let before = spans.len();
    let spans: Vec<Span> = spans
        .into_iter()
        .filter(|s| s.trace_id == trace_id)
        .collect();

    if spans.len() < before {
        warn!(
            "Dropped {} span(s) not belonging to trace {}",
            before - spans.len(),
            trace_id
        );
    }

    spans
}
