//! Span dependency graph: one node per span, one edge per resolved parent link.

use crate::aggregator::tree_builder::SpanArena;
use crate::parser::{Span, SpanType};
use crate::utils::config::{DEFAULT_NODE_DURATION_MS, NODE_SIZE_MAX, NODE_SIZE_MIN};
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub category: SpanType,

    /// Render radius, see `node_size`
    pub size: f64,
}

/// Parent -> child link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
}

/// Node/edge lists with edges also kept as node indices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,

    /// `(source, target)` indices into `nodes`, parallel to `edges`
    #[serde(skip)]
    pub links: Vec<(usize, usize)>,
}

impl SpanGraph {
    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == id)
    }
}

/// Radius for a node: `clamp(sqrt(duration) / 2, 15, 40)`
///
/// Grows sub-linearly and stays bounded regardless of outliers. Spans with
/// no recorded timing at all are sized as if they took 100ms.
pub fn node_size(duration_ms: Option<f64>) -> f64 {
    let duration = duration_ms.unwrap_or(DEFAULT_NODE_DURATION_MS).max(0.0);
    (duration.sqrt() / 2.0).clamp(NODE_SIZE_MIN, NODE_SIZE_MAX)
}

/// Build the dependency graph
///
/// **Public** - main entry point for graph building
///
/// Edge semantics match the tree builder: unresolved, self and cyclic
/// parent references produce no edge.
pub fn build_span_graph(spans: &[Span]) -> SpanGraph {
    let arena = SpanArena::build(spans);
    graph_from_arena(&arena)
}

/// Build the graph from an already-resolved arena
pub fn graph_from_arena(arena: &SpanArena<'_>) -> SpanGraph {
    let nodes: Vec<GraphNode> = arena
        .spans()
        .iter()
        .map(|span| GraphNode {
            id: span.id.clone(),
            label: span.name.clone(),
            category: span.span_type,
            size: node_size(span.recorded_duration_ms()),
        })
        .collect();

    let links: Vec<(usize, usize)> = (0..arena.len())
        .filter_map(|child| arena.parent(child).map(|parent| (parent, child)))
        .collect();

    let edges = links
        .iter()
        .map(|&(source, target)| GraphEdge {
            source: nodes[source].id.clone(),
            target: nodes[target].id.clone(),
        })
        .collect();

    debug!("Span graph: {} nodes, {} edges", nodes.len(), links.len());

    SpanGraph {
        nodes,
        edges,
        links,
    }
}
