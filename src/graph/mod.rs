//! Span dependency graph and its force-directed layout.

pub mod builder;
pub mod simulation;

pub use builder::{build_span_graph, graph_from_arena, node_size, GraphEdge, GraphNode, SpanGraph};
pub use simulation::{
    settle_layout, ForceSimulation, NodePosition, SimulationConfig, SimulationState,
};
