//! Latency heatmap: span counts by category x duration bucket.

use crate::parser::{Span, SpanType};
use crate::utils::config::DURATION_BUCKET_BOUNDS_MS;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed duration ranges, upper bound exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DurationBucket {
    #[serde(rename = "<10ms")]
    Under10,
    #[serde(rename = "10-50ms")]
    From10To50,
    #[serde(rename = "50-100ms")]
    From50To100,
    #[serde(rename = "100-500ms")]
    From100To500,
    #[serde(rename = "500ms-1s")]
    From500To1000,
    #[serde(rename = "1-5s")]
    From1000To5000,
    #[serde(rename = ">=5s")]
    Over5000,
}

impl DurationBucket {
    /// Ascending order
    pub const ALL: [DurationBucket; 7] = [
        DurationBucket::Under10,
        DurationBucket::From10To50,
        DurationBucket::From50To100,
        DurationBucket::From100To500,
        DurationBucket::From500To1000,
        DurationBucket::From1000To5000,
        DurationBucket::Over5000,
    ];

    /// First bucket whose upper bound exceeds the duration
    pub fn for_duration(duration_ms: f64) -> Self {
        DURATION_BUCKET_BOUNDS_MS
            .iter()
            .position(|&upper| duration_ms < upper)
            .map(|i| Self::ALL[i])
            .unwrap_or(DurationBucket::Over5000)
    }

    pub fn label(&self) -> &'static str {
        match self {
            DurationBucket::Under10 => "<10ms",
            DurationBucket::From10To50 => "10-50ms",
            DurationBucket::From50To100 => "50-100ms",
            DurationBucket::From100To500 => "100-500ms",
            DurationBucket::From500To1000 => "500ms-1s",
            DurationBucket::From1000To5000 => "1-5s",
            DurationBucket::Over5000 => ">=5s",
        }
    }

    /// Position in `ALL`
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Exclusive upper bound in ms, `None` for the open-ended bucket
    pub fn upper_bound_ms(&self) -> Option<f64> {
        DURATION_BUCKET_BOUNDS_MS.get(self.index()).copied()
    }
}

/// Counts for one category across all buckets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapRow {
    pub span_type: SpanType,

    /// Indexed like `DurationBucket::ALL`
    pub counts: Vec<u64>,
}

/// Duration summary for a category that has spans
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryLatency {
    pub span_type: SpanType,
    pub count: u64,
    pub mean_ms: f64,
    pub max_ms: f64,
}

/// Category x bucket frequency grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heatmap {
    pub buckets: Vec<DurationBucket>,

    /// One row per category, in `SpanType::ALL` order, zero-filled
    pub rows: Vec<HeatmapRow>,

    /// Largest single cell, for intensity normalization
    pub max_count: u64,

    /// Only categories that actually have spans
    pub summaries: Vec<CategoryLatency>,
}

impl Heatmap {
    pub fn count(&self, span_type: SpanType, bucket: DurationBucket) -> u64 {
        let col = bucket.index();
        self.rows
            .iter()
            .find(|r| r.span_type == span_type)
            .and_then(|r| r.counts.get(col).copied())
            .unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.rows.iter().flat_map(|r| r.counts.iter()).sum()
    }

    /// Cell intensity in `[0, 1]`
    pub fn intensity(&self, span_type: SpanType, bucket: DurationBucket) -> f64 {
        if self.max_count == 0 {
            0.0
        } else {
            self.count(span_type, bucket) as f64 / self.max_count as f64
        }
    }
}

/// Bucket every span by category and duration
///
/// **Public** - main entry point for heatmap building
pub fn build_heatmap(spans: &[Span], now: DateTime<Utc>) -> Heatmap {
    let mut grid = vec![vec![0u64; DurationBucket::ALL.len()]; SpanType::ALL.len()];
    let mut totals = [(0u64, 0.0f64, 0.0f64); SpanType::ALL.len()];

    for span in spans {
        let duration = span.effective_duration_ms(now);
        let row = span.span_type.index();
        let col = DurationBucket::for_duration(duration).index();
        grid[row][col] += 1;

        let (count, sum, max) = &mut totals[row];
        *count += 1;
        *sum += duration;
        *max = f64::max(*max, duration);
    }

    let max_count = grid.iter().flatten().copied().max().unwrap_or(0);

    let rows = SpanType::ALL
        .iter()
        .zip(grid)
        .map(|(span_type, counts)| HeatmapRow {
            span_type: *span_type,
            counts,
        })
        .collect();

    let summaries = SpanType::ALL
        .iter()
        .zip(totals.iter())
        .filter(|(_, (count, _, _))| *count > 0)
        .map(|(span_type, (count, sum, max))| CategoryLatency {
            span_type: *span_type,
            count: *count,
            mean_ms: sum / *count as f64,
            max_ms: *max,
        })
        .collect();

    Heatmap {
        buckets: DurationBucket::ALL.to_vec(),
        rows,
        max_count,
        summaries,
    }
}
