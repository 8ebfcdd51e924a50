use chrono::{DateTime, TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::HashSet;

use vizpath_studio::aggregator::{
    analyze_bundle, analyze_costs, build_heatmap, build_span_tree, estimate_cost, flatten_forest,
    layout_timeline, DurationBucket, RateTable,
};
use vizpath_studio::graph::build_span_graph;
use vizpath_studio::parser::{parse_bundle, Span, SpanType, TraceBundle};
use vizpath_studio::utils::config::AnalyticsConfig;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 10).unwrap()
}

/// Agent run as posted to the ingestion endpoint: one agent root, three
/// children, one nested LLM call without a model attribute
fn research_agent_bundle() -> TraceBundle {
    let raw = json!([
        {
            "span_id": "root", "trace_id": "run-42", "name": "agent",
            "span_type": "agent", "status": "success",
            "start_time": "2024-07-01T12:00:00Z", "end_time": "2024-07-01T12:00:01Z",
            "duration_ms": 1000.0
        },
        {
            "span_id": "plan", "trace_id": "run-42", "parent_id": "root", "name": "llm",
            "span_type": "llm", "status": "success",
            "start_time": "2024-07-01T12:00:00.050Z", "end_time": "2024-07-01T12:00:00.250Z",
            "duration_ms": 200.0, "token_count": 500,
            "attributes": {"model": "gpt-4o"}
        },
        {
            "span_id": "search", "trace_id": "run-42", "parent_id": "root", "name": "tool",
            "span_type": "tool", "status": "success",
            "start_time": "2024-07-01T12:00:00.300Z", "end_time": "2024-07-01T12:00:00.450Z",
            "duration_ms": 150.0
        },
        {
            "span_id": "docs", "trace_id": "run-42", "parent_id": "root", "name": "retrieval",
            "span_type": "retrieval", "status": "success",
            "start_time": "2024-07-01T12:00:00.500Z", "end_time": "2024-07-01T12:00:00.800Z",
            "duration_ms": 300.0
        },
        {
            "span_id": "rewrite", "trace_id": "run-42", "parent_id": "plan", "name": "llm",
            "span_type": "llm", "status": "success",
            "start_time": "2024-07-01T12:00:00.100Z", "end_time": "2024-07-01T12:00:00.200Z",
            "duration_ms": 100.0, "token_count": 100
        }
    ]);

    parse_bundle(&raw).unwrap()
}

#[test]
fn test_end_to_end_tree() {
    let bundle = research_agent_bundle();
    let roots = build_span_tree(&bundle.spans);

    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0].span.id, "root");
    assert_eq!(roots[0].depth, 0);
    assert_eq!(roots[0].children.len(), 3);
    assert!(roots[0].children.iter().all(|c| c.depth == 1));

    let plan = &roots[0].children[0];
    assert_eq!(plan.span.id, "plan");
    assert_eq!(plan.children.len(), 1);
    assert_eq!(plan.children[0].span.id, "rewrite");
    assert_eq!(plan.children[0].depth, 2);
}

#[test]
fn test_end_to_end_costs() {
    let bundle = research_agent_bundle();
    let costs = analyze_costs(&bundle.spans, None, &RateTable::default(), now());

    let llm = &costs.categories[0];
    assert_eq!(llm.span_type, SpanType::Llm);
    assert_eq!(llm.count, 2);
    assert_eq!(llm.tokens, 600);

    // 500 tokens at the gpt-4o rate + 100 tokens at the default rate
    let expected = 0.5 * 0.005 + 0.1 * 0.002;
    assert!((llm.cost - expected).abs() < 1e-12);
    assert!((costs.total_cost - expected).abs() < 1e-12);

    assert_eq!(costs.top_spans.len(), 2);
    assert_eq!(costs.top_spans[0].span_id, "plan");
    assert_eq!(costs.top_spans[0].model.as_deref(), Some("gpt-4o"));
    assert_eq!(costs.top_spans[1].model, None);
}

#[test]
fn test_end_to_end_heatmap() {
    let bundle = research_agent_bundle();
    let heatmap = build_heatmap(&bundle.spans, now());

    assert_eq!(heatmap.total(), 5);
    // Upper-exclusive bounds: both 100ms and 150ms land in 100-500ms
    assert_eq!(heatmap.count(SpanType::Llm, DurationBucket::From100To500), 2);
    assert_eq!(heatmap.count(SpanType::Tool, DurationBucket::From100To500), 1);
    assert_eq!(heatmap.count(SpanType::Agent, DurationBucket::From1000To5000), 1);
    assert_eq!(heatmap.summaries.len(), 4);
}

#[test]
fn test_end_to_end_report() {
    let bundle = research_agent_bundle();
    let report = analyze_bundle(&bundle, &AnalyticsConfig::default(), now());

    assert_eq!(report.summary.trace_id, "run-42");
    assert_eq!(report.summary.name, "agent");
    assert_eq!(report.summary.span_count, 5);
    assert_eq!(report.summary.max_depth, 2);
    assert_eq!(report.summary.total_tokens, 600);
    assert_eq!(report.summary.duration_ms, 1000.0);

    assert_eq!(report.graph.graph.edges.len(), 4);
    assert_eq!(report.graph.positions.len(), 5);
    assert!(report.graph.ticks <= AnalyticsConfig::default().simulation.max_ticks);
}

#[test]
fn test_flattened_tree_matches_input_ids() {
    let bundle = research_agent_bundle();
    let roots = build_span_tree(&bundle.spans);
    let flat = flatten_forest(&roots);

    let input: HashSet<&str> = bundle.spans.iter().map(|s| s.id.as_str()).collect();
    let output: HashSet<&str> = flat.iter().map(|n| n.span.id.as_str()).collect();

    assert_eq!(flat.len(), bundle.spans.len());
    assert_eq!(input, output);
}

#[test]
fn test_tree_independent_of_input_order() {
    let bundle = research_agent_bundle();
    let mut reversed = bundle.spans.clone();
    reversed.reverse();

    let depths = |spans: &[Span]| {
        let mut pairs: Vec<(String, usize)> = flatten_forest(&build_span_tree(spans))
            .iter()
            .map(|n| (n.span.id.clone(), n.depth))
            .collect();
        pairs.sort();
        pairs
    };

    assert_eq!(depths(&bundle.spans), depths(&reversed));
}

#[test]
fn test_timeline_bounds() {
    let bundle = research_agent_bundle();
    let layout = layout_timeline(&bundle.spans, now());

    assert_eq!(layout.bars.len(), 5);
    for bar in &layout.bars {
        assert!(bar.left_percent >= 0.0);
        assert!(bar.width_percent >= 0.5);
    }

    let docs = layout.bars.iter().find(|b| b.span_id == "docs").unwrap();
    assert!((docs.left_percent - 50.0).abs() < 1e-9);
    assert!((docs.width_percent - 30.0).abs() < 1e-9);
}

#[test]
fn test_graph_edges_match_tree() {
    let bundle = research_agent_bundle();
    let graph = build_span_graph(&bundle.spans);

    assert_eq!(graph.nodes.len(), 5);
    assert!(graph
        .edges
        .iter()
        .any(|e| e.source == "plan" && e.target == "rewrite"));
    assert!(graph.edges.iter().all(|e| e.target != "root"));
}

#[test]
fn test_reference_rates() {
    assert!((estimate_cost(1000, Some("gpt-4")) - 0.03).abs() < 1e-12);
    assert!((estimate_cost(1000, Some("some-new-model")) - 0.002).abs() < 1e-12);
    assert!((estimate_cost(1000, None) - 0.002).abs() < 1e-12);
}

#[test]
fn test_category_costs_sum_to_total() {
    let bundle = research_agent_bundle();
    let costs = analyze_costs(&bundle.spans, None, &RateTable::default(), now());

    let summed: f64 = costs.categories.iter().map(|c| c.cost).sum();
    assert_eq!(summed, costs.total_cost);
}

#[test]
fn test_aggregates_monotonic_under_removal() {
    let bundle = research_agent_bundle();
    let rates = RateTable::default();
    let full = analyze_costs(&bundle.spans, None, &rates, now());

    for skip in 0..bundle.spans.len() {
        let subset: Vec<Span> = bundle
            .spans
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != skip)
            .map(|(_, s)| s.clone())
            .collect();
        let partial = analyze_costs(&subset, None, &rates, now());

        assert!(partial.total_tokens <= full.total_tokens);
        assert!(partial.total_cost <= full.total_cost + 1e-12);
    }
}

#[test]
fn test_empty_input_is_not_an_error() {
    let bundle = parse_bundle(&json!([])).unwrap();
    let report = analyze_bundle(&bundle, &AnalyticsConfig::default(), now());

    assert!(report.tree.is_empty());
    assert!(report.timeline.bars.is_empty());
    assert!(report.graph.graph.nodes.is_empty());
    assert!(report.costs.categories.is_empty());
    assert_eq!(report.heatmap.total(), 0);
    assert_eq!(report.heatmap.max_count, 0);
}
