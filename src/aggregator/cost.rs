//! Token and cost aggregation by span category.
//!
//! Rates are USD per 1000 tokens, looked up by model name with a default
//! fallback. A span's own `cost` is trusted when present; otherwise the
//! engine estimates it from tokens and model.

use crate::parser::{Span, SpanType};
use crate::utils::config::{PricingConfig, DEFAULT_RATE_PER_1K, MODEL_RATES_PER_1K, TOP_COST_SPANS};
use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Per-model price table with a default rate
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    rates: HashMap<String, f64>,
    default_rate: f64,
}

impl Default for RateTable {
    fn default() -> Self {
        Self {
            rates: MODEL_RATES_PER_1K
                .iter()
                .map(|(model, rate)| (model.to_string(), *rate))
                .collect(),
            default_rate: DEFAULT_RATE_PER_1K,
        }
    }
}

impl RateTable {
    /// Built-in table with config overrides applied on top
    pub fn from_config(pricing: &PricingConfig) -> Self {
        let mut table = Self::default();
        table.default_rate = pricing.default_rate;
        for (model, rate) in &pricing.models {
            table.rates.insert(normalize_model(model), *rate);
        }
        table
    }

    pub fn default_rate(&self) -> f64 {
        self.default_rate
    }

    /// Rate for a model; unknown or missing models get the default rate
    pub fn rate_for(&self, model: Option<&str>) -> f64 {
        model
            .and_then(|m| self.rates.get(&normalize_model(m)))
            .copied()
            .unwrap_or(self.default_rate)
    }

    /// `(tokens / 1000) * rate`
    pub fn estimate(&self, tokens: u64, model: Option<&str>) -> f64 {
        (tokens as f64 / 1000.0) * self.rate_for(model)
    }

    /// Cost attributed to one span: its recorded cost, else the estimate
    pub fn span_cost(&self, span: &Span) -> f64 {
        match span.cost {
            Some(cost) if cost.is_finite() => cost.max(0.0),
            _ => self.estimate(span.tokens.unwrap_or(0), span.model()),
        }
    }
}

fn normalize_model(model: &str) -> String {
    model.trim().to_ascii_lowercase()
}

/// Estimate cost with the built-in table
///
/// **Public** - convenience wrapper around `RateTable::estimate`
pub fn estimate_cost(tokens: u64, model: Option<&str>) -> f64 {
    RateTable::default().estimate(tokens, model)
}

/// Aggregates for one span category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCost {
    pub span_type: SpanType,
    pub count: u64,
    pub tokens: u64,
    pub cost: f64,
    pub duration_ms: f64,
    pub avg_cost: f64,

    /// Cost per second of span time; 0 when the category has no duration
    pub cost_per_second: f64,
}

/// One of the individually most expensive spans
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanCost {
    pub span_id: String,
    pub name: String,
    pub span_type: SpanType,
    pub tokens: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    pub cost: f64,
}

/// Where `total_cost` came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostSource {
    /// Trace-level total supplied by the repository
    External,
    /// Sum of per-category estimates
    Estimated,
}

/// Complete cost breakdown for a span set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    /// Sorted by cost, descending
    pub categories: Vec<CategoryCost>,

    /// Most expensive token-bearing spans, descending
    pub top_spans: Vec<SpanCost>,

    pub total_tokens: u64,

    /// Sum of the per-category costs
    pub estimated_cost: f64,

    /// External total when supplied, else `estimated_cost`
    pub total_cost: f64,

    pub cost_source: CostSource,
}

/// Aggregate tokens and cost per category
///
/// **Public** - main entry point for cost analysis
///
/// # Arguments
/// * `spans` - Flat span set
/// * `external_total` - Trace-level total cost, used instead of the estimate when present
/// * `rates` - Price table
/// * `now` - Instant used for durations of running spans
pub fn analyze_costs(
    spans: &[Span],
    external_total: Option<f64>,
    rates: &RateTable,
    now: DateTime<Utc>,
) -> CostBreakdown {
    analyze_costs_top_k(spans, external_total, rates, now, TOP_COST_SPANS)
}

/// `analyze_costs` with a configurable number of top spans
pub fn analyze_costs_top_k(
    spans: &[Span],
    external_total: Option<f64>,
    rates: &RateTable,
    now: DateTime<Utc>,
    top_k: usize,
) -> CostBreakdown {
    debug!("Aggregating costs over {} spans", spans.len());

    let mut groups: HashMap<SpanType, CategoryCost> = HashMap::new();
    let mut candidates: Vec<(usize, SpanCost)> = Vec::new();

    for (i, span) in spans.iter().enumerate() {
        let cost = rates.span_cost(span);
        let tokens = span.tokens.unwrap_or(0);

        let group = groups.entry(span.span_type).or_insert_with(|| CategoryCost {
            span_type: span.span_type,
            count: 0,
            tokens: 0,
            cost: 0.0,
            duration_ms: 0.0,
            avg_cost: 0.0,
            cost_per_second: 0.0,
        });
        group.count += 1;
        group.tokens = group.tokens.saturating_add(tokens);
        group.cost += cost;
        group.duration_ms += span.effective_duration_ms(now);

        if tokens > 0 {
            candidates.push((
                i,
                SpanCost {
                    span_id: span.id.clone(),
                    name: span.name.clone(),
                    span_type: span.span_type,
                    tokens,
                    model: span.model().map(str::to_string),
                    cost,
                },
            ));
        }
    }

    let mut categories: Vec<CategoryCost> = groups
        .into_values()
        .map(|mut g| {
            g.avg_cost = g.cost / g.count as f64;
            g.cost_per_second = if g.duration_ms > 0.0 {
                (g.cost / g.duration_ms) * 1000.0
            } else {
                0.0
            };
            g
        })
        .collect();

    categories.sort_by(|a, b| {
        b.cost
            .total_cmp(&a.cost)
            .then_with(|| a.span_type.cmp(&b.span_type))
    });

    let top_spans = select_top_spans(candidates, top_k);

    let total_tokens = categories
        .iter()
        .fold(0u64, |acc, c| acc.saturating_add(c.tokens));
    let estimated_cost: f64 = categories.iter().map(|c| c.cost).sum();

    let (total_cost, cost_source) = match external_total {
        Some(total) if total.is_finite() => (total.max(0.0), CostSource::External),
        _ => (estimated_cost, CostSource::Estimated),
    };

    CostBreakdown {
        categories,
        top_spans,
        total_tokens,
        estimated_cost,
        total_cost,
        cost_source,
    }
}

/// Partial top-k by cost; ties keep input order
fn select_top_spans(mut candidates: Vec<(usize, SpanCost)>, k: usize) -> Vec<SpanCost> {
    let by_cost_desc = |a: &(usize, SpanCost), b: &(usize, SpanCost)| -> Ordering {
        b.1.cost.total_cmp(&a.1.cost).then_with(|| a.0.cmp(&b.0))
    };

    if k == 0 {
        return Vec::new();
    }
    if candidates.len() > k {
        candidates.select_nth_unstable_by(k - 1, by_cost_desc);
        candidates.truncate(k);
    }
    candidates.sort_by(by_cost_desc);

    candidates.into_iter().map(|(_, span_cost)| span_cost).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn llm(id: &str, tokens: u64, model: Option<&str>, duration_ms: f64) -> Span {
        let mut s = Span::new(id, "t", id, SpanType::Llm, t0());
        s.tokens = Some(tokens);
        s.duration_ms = Some(duration_ms);
        if let Some(m) = model {
            s.attributes.insert("model".to_string(), serde_json::json!(m));
        }
        s
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_estimate_known_model() {
        assert!(approx(estimate_cost(1000, Some("gpt-4")), 0.03));
        assert!(approx(estimate_cost(1000, Some("GPT-4 ")), 0.03));
    }

    #[test]
    fn test_estimate_unknown_model_uses_default() {
        assert!(approx(estimate_cost(1000, Some("my-local-llama")), 0.002));
        assert!(approx(estimate_cost(1000, None), DEFAULT_RATE_PER_1K));
    }

    #[test]
    fn test_gpt4o_is_not_gpt4() {
        let table = RateTable::default();
        assert_ne!(table.rate_for(Some("gpt-4o")), table.rate_for(Some("gpt-4")));
    }

    #[test]
    fn test_config_overrides() {
        let mut pricing = PricingConfig::default();
        pricing.default_rate = 0.01;
        pricing.models.insert("My-Model".to_string(), 0.5);

        let table = RateTable::from_config(&pricing);
        assert_eq!(table.rate_for(Some("my-model")), 0.5);
        assert_eq!(table.rate_for(Some("nope")), 0.01);
        assert_eq!(table.rate_for(Some("gpt-4")), 0.03);
    }

    #[test]
    fn test_recorded_cost_trusted() {
        let mut span = llm("a", 1000, Some("gpt-4"), 10.0);
        span.cost = Some(1.25);
        assert_eq!(RateTable::default().span_cost(&span), 1.25);

        span.cost = Some(-3.0);
        assert_eq!(RateTable::default().span_cost(&span), 0.0);
    }

    #[test]
    fn test_category_aggregation() {
        let mut tool = Span::new("t1", "t", "search", SpanType::Tool, t0());
        tool.duration_ms = Some(500.0);

        let spans = vec![
            llm("a", 1000, Some("gpt-4"), 1000.0),
            llm("b", 1000, None, 1000.0),
            tool,
        ];

        let breakdown = analyze_costs(&spans, None, &RateTable::default(), t0());
        assert_eq!(breakdown.categories[0].span_type, SpanType::Llm);

        let llm_group = &breakdown.categories[0];
        assert_eq!(llm_group.count, 2);
        assert_eq!(llm_group.tokens, 2000);
        assert!(approx(llm_group.cost, 0.032));
        assert!(approx(llm_group.avg_cost, 0.016));
        assert!(approx(llm_group.cost_per_second, 0.016));

        let tool_group = &breakdown.categories[1];
        assert_eq!(tool_group.cost, 0.0);
        assert_eq!(tool_group.cost_per_second, 0.0);
    }

    #[test]
    fn test_zero_duration_rate_guarded() {
        let spans = vec![llm("a", 1000, Some("gpt-4"), 0.0)];
        let breakdown = analyze_costs(&spans, None, &RateTable::default(), t0());
        assert_eq!(breakdown.categories[0].cost_per_second, 0.0);
    }

    #[test]
    fn test_external_total_is_fallback_not_blend() {
        let spans = vec![llm("a", 1000, Some("gpt-4"), 10.0)];

        let external = analyze_costs(&spans, Some(9.0), &RateTable::default(), t0());
        assert_eq!(external.total_cost, 9.0);
        assert_eq!(external.cost_source, CostSource::External);
        assert!(approx(external.estimated_cost, 0.03));

        let estimated = analyze_costs(&spans, None, &RateTable::default(), t0());
        assert_eq!(estimated.total_cost, estimated.estimated_cost);
        assert_eq!(estimated.cost_source, CostSource::Estimated);
    }

    #[test]
    fn test_category_sum_equals_estimate() {
        let mut spans = vec![
            llm("a", 1200, Some("gpt-4o"), 10.0),
            llm("b", 300, Some("claude-3-opus"), 10.0),
        ];
        let mut retrieval = Span::new("r", "t", "vector", SpanType::Retrieval, t0());
        retrieval.tokens = Some(800);
        spans.push(retrieval);

        let breakdown = analyze_costs(&spans, None, &RateTable::default(), t0());
        let sum: f64 = breakdown.categories.iter().map(|c| c.cost).sum();
        assert!(approx(sum, breakdown.total_cost));
        assert_eq!(breakdown.total_tokens, 2300);
    }

    #[test]
    fn test_top_spans_limited_and_sorted() {
        let spans: Vec<Span> = (1..=8)
            .map(|i| llm(&format!("s{}", i), i * 100, Some("gpt-4"), 10.0))
            .chain(std::iter::once(llm("zero", 0, Some("gpt-4"), 10.0)))
            .collect();

        let breakdown = analyze_costs(&spans, None, &RateTable::default(), t0());
        let ids: Vec<_> = breakdown.top_spans.iter().map(|s| s.span_id.as_str()).collect();
        assert_eq!(ids, vec!["s8", "s7", "s6", "s5", "s4"]);
    }

    #[test]
    fn test_removing_span_never_increases_totals() {
        let spans = vec![
            llm("a", 1000, Some("gpt-4"), 100.0),
            llm("b", 500, None, 100.0),
        ];
        let full = analyze_costs(&spans, None, &RateTable::default(), t0());
        let partial = analyze_costs(&spans[..1], None, &RateTable::default(), t0());

        assert!(partial.total_cost <= full.total_cost);
        assert!(partial.total_tokens <= full.total_tokens);
    }

    #[test]
    fn test_token_totals_saturate() {
        let spans = vec![
            llm("huge", u64::MAX, None, 100.0),
            llm("small", 1, None, 100.0),
        ];
        let full = analyze_costs(&spans, None, &RateTable::default(), t0());
        let partial = analyze_costs(&spans[..1], None, &RateTable::default(), t0());

        assert_eq!(full.total_tokens, u64::MAX);
        assert_eq!(full.categories[0].tokens, u64::MAX);
        assert!(partial.total_tokens <= full.total_tokens);
    }

    #[test]
    fn test_running_span_duration_uses_now() {
        let mut span = Span::new("a", "t", "stream", SpanType::Llm, t0());
        span.tokens = Some(1000);
        let now = t0() + Duration::seconds(2);

        let breakdown = analyze_costs(&[span], None, &RateTable::default(), now);
        assert_eq!(breakdown.categories[0].duration_ms, 2000.0);
    }

    #[test]
    fn test_empty_input() {
        let breakdown = analyze_costs(&[], None, &RateTable::default(), t0());
        assert!(breakdown.categories.is_empty());
        assert!(breakdown.top_spans.is_empty());
        assert_eq!(breakdown.total_cost, 0.0);
        assert_eq!(breakdown.total_tokens, 0);
    }
}
