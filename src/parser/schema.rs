//! Span and trace schema definitions.
//!
//! These mirror the JSON shapes served by the trace repository
//! (`GET /traces/{id}` returns `{ "trace": ..., "spans": [...] }`).

use crate::utils::config::MODEL_ATTRIBUTE_KEYS;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Operation kind of a span
///
/// Unknown labels fold into `Custom` here and nowhere else.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SpanType {
    Llm,
    Tool,
    Agent,
    Retrieval,
    Chain,
    #[default]
    #[serde(other)]
    Custom,
}

impl SpanType {
    /// Every category, in display order
    pub const ALL: [SpanType; 6] = [
        SpanType::Llm,
        SpanType::Tool,
        SpanType::Agent,
        SpanType::Retrieval,
        SpanType::Chain,
        SpanType::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SpanType::Llm => "llm",
            SpanType::Tool => "tool",
            SpanType::Agent => "agent",
            SpanType::Retrieval => "retrieval",
            SpanType::Chain => "chain",
            SpanType::Custom => "custom",
        }
    }

    /// Position in `ALL`, used for fixed-size per-category tables
    pub fn index(&self) -> usize {
        match self {
            SpanType::Llm => 0,
            SpanType::Tool => 1,
            SpanType::Agent => 2,
            SpanType::Retrieval => 3,
            SpanType::Chain => 4,
            SpanType::Custom => 5,
        }
    }
}

impl fmt::Display for SpanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Execution status of a span or trace
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanStatus {
    Running,
    #[default]
    Success,
    Error,
}

impl SpanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpanStatus::Running => "running",
            SpanStatus::Success => "success",
            SpanStatus::Error => "error",
        }
    }
}

impl fmt::Display for SpanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One timed operation within a trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    /// Unique span id (ingestion payloads call it `span_id`)
    #[serde(alias = "span_id")]
    pub id: String,

    pub trace_id: String,

    /// Declared parent; may be dangling
    #[serde(default)]
    pub parent_id: Option<String>,

    /// Display label, not unique
    pub name: String,

    #[serde(default)]
    pub span_type: SpanType,

    #[serde(default)]
    pub status: SpanStatus,

    pub start_time: DateTime<Utc>,

    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,

    #[serde(default)]
    pub duration_ms: Option<f64>,

    /// Token usage
    #[serde(default, alias = "token_count")]
    pub tokens: Option<u64>,

    /// Externally computed cost, trusted over local estimates
    #[serde(default)]
    pub cost: Option<f64>,

    #[serde(default)]
    pub attributes: HashMap<String, serde_json::Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,

    #[serde(default)]
    pub error: Option<String>,
}

impl Span {
    /// Create a minimal span; mostly useful for tests and synthetic data
    pub fn new(
        id: impl Into<String>,
        trace_id: impl Into<String>,
        name: impl Into<String>,
        span_type: SpanType,
        start_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            trace_id: trace_id.into(),
            parent_id: None,
            name: name.into(),
            span_type,
            status: SpanStatus::Success,
            start_time,
            end_time: None,
            duration_ms: None,
            tokens: None,
            cost: None,
            attributes: HashMap::new(),
            events: Vec::new(),
            input: None,
            output: None,
            error: None,
        }
    }

    /// Model identifier from the span attributes, if any
    pub fn model(&self) -> Option<&str> {
        MODEL_ATTRIBUTE_KEYS
            .iter()
            .filter_map(|key| self.attributes.get(*key))
            .find_map(|value| value.as_str())
            .map(str::trim)
            .filter(|model| !model.is_empty())
    }

    /// Elapsed time in milliseconds, never negative
    ///
    /// Uses the recorded duration, then `end - start`, then `now - start`
    /// for spans that are still running.
    pub fn effective_duration_ms(&self, now: DateTime<Utc>) -> f64 {
        let raw = match (self.duration_ms, self.end_time) {
            (Some(duration), _) => duration,
            (None, Some(end)) => millis_between(self.start_time, end),
            (None, None) => millis_between(self.start_time, now),
        };

        if raw.is_finite() {
            raw.max(0.0)
        } else {
            0.0
        }
    }

    /// Recorded timing only: duration, else `end - start`; `None` when neither exists
    pub fn recorded_duration_ms(&self) -> Option<f64> {
        self.duration_ms
            .or_else(|| self.end_time.map(|end| millis_between(self.start_time, end)))
            .filter(|d| d.is_finite())
            .map(|d| d.max(0.0))
    }

    /// End of the span on the timeline (`now` while running)
    pub fn end_or(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.end_time.unwrap_or(now)
    }

    pub fn is_error(&self) -> bool {
        self.status == SpanStatus::Error || self.error.is_some()
    }
}

/// Milliseconds from `start` to `end`; negative when `end` precedes `start`
pub fn millis_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    let delta = end - start;
    match delta.num_microseconds() {
        Some(us) => us as f64 / 1000.0,
        None => delta.num_milliseconds() as f64,
    }
}

/// One end-to-end execution session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub status: SpanStatus,

    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,

    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,

    #[serde(default)]
    pub duration_ms: Option<f64>,

    #[serde(default)]
    pub total_tokens: Option<u64>,

    #[serde(default)]
    pub total_cost: Option<f64>,

    #[serde(default)]
    pub span_count: u64,

    #[serde(default)]
    pub error_count: u64,

    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Trace {
    /// Roll up trace-level aggregates from its spans
    ///
    /// Matches what the ingestion endpoint stores: counts, token and cost sums
    /// (`None` when no span reports any), and a status that is `error` if any
    /// span failed, `running` if any span is still open.
    pub fn from_spans(id: impl Into<String>, spans: &[Span]) -> Self {
        let id = id.into();

        let name = spans
            .iter()
            .find(|s| s.parent_id.is_none())
            .or_else(|| spans.first())
            .map(|s| s.name.clone())
            .unwrap_or_else(|| "trace".to_string());

        let total_tokens = spans
            .iter()
            .filter_map(|s| s.tokens)
            .reduce(u64::saturating_add);
        let total_cost = spans.iter().filter_map(|s| s.cost).reduce(|acc, c| acc + c);
        let error_count = spans.iter().filter(|s| s.is_error()).count() as u64;

        let status = if error_count > 0 {
            SpanStatus::Error
        } else if spans.iter().any(|s| s.status == SpanStatus::Running) {
            SpanStatus::Running
        } else {
            SpanStatus::Success
        };

        let start_time = spans.iter().map(|s| s.start_time).min();
        let end_time = if status == SpanStatus::Running {
            None
        } else {
            spans.iter().filter_map(|s| s.end_time).max()
        };
        let duration_ms = match (start_time, end_time) {
            (Some(start), Some(end)) => Some(millis_between(start, end).max(0.0)),
            _ => None,
        };

        Self {
            id,
            name,
            status,
            start_time,
            end_time,
            duration_ms,
            total_tokens,
            total_cost,
            span_count: spans.len() as u64,
            error_count,
            metadata: HashMap::new(),
        }
    }
}

/// A trace together with its flat, unordered span set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceBundle {
    pub trace: Trace,
    pub spans: Vec<Span>,
}
