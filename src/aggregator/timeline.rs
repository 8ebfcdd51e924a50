//! Relative timeline layout for waterfall rendering.
//!
//! Each span gets a left offset and width as a percentage of the trace's
//! time window. No pixels here; the renderer scales these itself.

use super::tree_builder::SpanArena;
use crate::parser::{millis_between, Span};
use crate::utils::config::{DEGENERATE_WINDOW_MS, MIN_BAR_WIDTH_PERCENT};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Global time window of a span set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Earliest start
    pub min: DateTime<Utc>,

    /// Latest end (or `now` for running spans)
    pub max: DateTime<Utc>,
}

impl TimeWindow {
    /// Compute the window, `None` for an empty set
    ///
    /// `now` is evaluated once by the caller and used for every running span.
    pub fn from_spans(spans: &[Span], now: DateTime<Utc>) -> Option<Self> {
        let min = spans.iter().map(|s| s.start_time).min()?;
        let max = spans
            .iter()
            .map(|s| s.end_or(now).max(s.start_time))
            .max()?;

        Some(Self { min, max })
    }

    /// Window length in ms; a positive epsilon when the window is a single instant
    pub fn total_ms(&self) -> f64 {
        let total = millis_between(self.min, self.max);
        if total > 0.0 {
            total
        } else {
            DEGENERATE_WINDOW_MS
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.max <= self.min
    }
}

/// Horizontal placement of one span
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineBar {
    pub span_id: String,
    pub name: String,
    pub depth: usize,
    pub duration_ms: f64,
    pub left_percent: f64,
    pub width_percent: f64,
}

/// Timeline for a whole span set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineLayout {
    /// `None` when there are no spans
    pub window: Option<TimeWindow>,

    pub total_duration_ms: f64,

    /// Bars in tree pre-order, the row order of a waterfall view
    pub bars: Vec<TimelineBar>,
}

/// Lay out every span against the shared time window
///
/// **Public** - main entry point for timeline layout
///
/// # Arguments
/// * `spans` - Flat span set
/// * `now` - Instant used for spans that have not ended
pub fn layout_timeline(spans: &[Span], now: DateTime<Utc>) -> TimelineLayout {
    let window = match TimeWindow::from_spans(spans, now) {
        Some(window) => window,
        None => {
            return TimelineLayout {
                window: None,
                total_duration_ms: 0.0,
                bars: Vec::new(),
            }
        }
    };

    let total = window.total_ms();
    let degenerate = window.is_degenerate();
    let arena = SpanArena::build(spans);

    let bars = arena
        .preorder()
        .into_iter()
        .map(|i| {
            let span = arena.span(i);
            let duration_ms = span.effective_duration_ms(now);
            let left_percent = if degenerate {
                0.0
            } else {
                (millis_between(window.min, span.start_time) / total * 100.0).max(0.0)
            };

            TimelineBar {
                span_id: span.id.clone(),
                name: span.name.clone(),
                depth: arena.depth(i),
                duration_ms,
                left_percent,
                width_percent: bar_width(duration_ms, total),
            }
        })
        .collect();

    TimelineLayout {
        window: Some(window),
        total_duration_ms: if degenerate { 0.0 } else { total },
        bars,
    }
}

/// Width in percent, floored so instantaneous spans stay visible
pub fn bar_width(duration_ms: f64, total_ms: f64) -> f64 {
    (duration_ms / total_ms * 100.0).max(MIN_BAR_WIDTH_PERCENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::SpanType;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 8, 0, 0).unwrap()
    }

    fn timed(id: &str, start_ms: i64, end_ms: Option<i64>) -> Span {
        let mut s = Span::new(id, "t", id, SpanType::Tool, t0() + Duration::milliseconds(start_ms));
        s.end_time = end_ms.map(|e| t0() + Duration::milliseconds(e));
        s
    }

    #[test]
    fn test_basic_layout() {
        let spans = vec![timed("a", 0, Some(1000)), timed("b", 250, Some(750))];
        let layout = layout_timeline(&spans, t0());

        assert_eq!(layout.total_duration_ms, 1000.0);
        assert_eq!(layout.bars[0].left_percent, 0.0);
        assert_eq!(layout.bars[0].width_percent, 100.0);
        assert_eq!(layout.bars[1].left_percent, 25.0);
        assert_eq!(layout.bars[1].width_percent, 50.0);
    }

    #[test]
    fn test_running_span_extends_to_now() {
        let spans = vec![timed("a", 0, Some(100)), timed("b", 100, None)];
        let now = t0() + Duration::milliseconds(400);
        let layout = layout_timeline(&spans, now);

        assert_eq!(layout.window.unwrap().max, now);
        assert_eq!(layout.total_duration_ms, 400.0);
        assert_eq!(layout.bars[1].width_percent, 75.0);
    }

    #[test]
    fn test_zero_duration_gets_min_width() {
        let spans = vec![timed("a", 0, Some(10_000)), timed("b", 5000, Some(5000))];
        let layout = layout_timeline(&spans, t0());
        assert_eq!(layout.bars[1].width_percent, MIN_BAR_WIDTH_PERCENT);
    }

    #[test]
    fn test_degenerate_window() {
        let spans = vec![timed("a", 0, Some(0)), timed("b", 0, Some(0))];
        let layout = layout_timeline(&spans, t0());

        assert!(layout.window.unwrap().is_degenerate());
        assert!(layout.bars.iter().all(|b| b.left_percent == 0.0));
        assert!(layout.bars.iter().all(|b| b.width_percent >= MIN_BAR_WIDTH_PERCENT));
        assert!(layout.bars.iter().all(|b| b.width_percent.is_finite()));
    }

    #[test]
    fn test_end_before_start_clamped() {
        let spans = vec![timed("a", 0, Some(1000)), timed("bad", 500, Some(100))];
        let layout = layout_timeline(&spans, t0());

        let bad = layout.bars.iter().find(|b| b.span_id == "bad").unwrap();
        assert_eq!(bad.duration_ms, 0.0);
        assert_eq!(bad.width_percent, MIN_BAR_WIDTH_PERCENT);
    }

    #[test]
    fn test_bars_follow_tree_order() {
        let mut child = timed("child", 10, Some(20));
        child.parent_id = Some("root".to_string());
        let spans = vec![timed("other", 50, Some(60)), child, timed("root", 0, Some(100))];

        let layout = layout_timeline(&spans, t0());
        let order: Vec<_> = layout.bars.iter().map(|b| b.span_id.as_str()).collect();
        assert_eq!(order, vec!["other", "root", "child"]);
        assert_eq!(layout.bars[2].depth, 1);
    }

    #[test]
    fn test_empty_layout() {
        let layout = layout_timeline(&[], t0());
        assert!(layout.window.is_none());
        assert!(layout.bars.is_empty());
    }
}
