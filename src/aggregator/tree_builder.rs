//! Reconstruct the parent-child forest from a flat span set.
//!
//! Parent references are resolved once, into an indexed arena. Everything
//! downstream (tree materialization, graph edges, depths) reads indices and
//! never goes back to string lookups.
//!
//! Resolution rules:
//! - a parent id that names no span in the set makes the span a root
//! - a span naming itself as parent is a root
//! - every span on a parent cycle (A -> B -> A) is a root; spans hanging
//!   off a cycle member stay attached to it
//! - roots and siblings keep input order

use crate::parser::Span;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Index-based view of a span set with validated parent links
///
/// **Public** - shared by the tree, timeline and graph builders
#[derive(Debug, Clone)]
pub struct SpanArena<'a> {
    spans: &'a [Span],
    parents: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
    depths: Vec<usize>,
    roots: Vec<usize>,
}

/// Walk state for cycle detection
#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    Unseen,
    OnPath,
    Done,
}

impl<'a> SpanArena<'a> {
    /// Resolve parent links for `spans`
    ///
    /// Never fails; malformed references degrade to roots.
    pub fn build(spans: &'a [Span]) -> Self {
        // Pass 1: one slot per span, indexed by id. First occurrence wins
        // for duplicated ids.
        let mut index: HashMap<&str, usize> = HashMap::with_capacity(spans.len());
        for (i, span) in spans.iter().enumerate() {
            index.entry(span.id.as_str()).or_insert(i);
        }

        // Pass 2: resolve declared parents to indices
        let mut parents: Vec<Option<usize>> = spans
            .iter()
            .enumerate()
            .map(|(i, span)| {
                span.parent_id
                    .as_deref()
                    .and_then(|pid| index.get(pid).copied())
                    .filter(|&p| p != i)
            })
            .collect();

        let broken = break_cycles(&mut parents);
        if broken > 0 {
            warn!("Parent cycle detected: {} span(s) promoted to roots", broken);
        }

        let mut children: Vec<Vec<usize>> = vec![Vec::new(); spans.len()];
        let mut roots = Vec::new();
        for (i, parent) in parents.iter().enumerate() {
            match parent {
                Some(p) => children[*p].push(i),
                None => roots.push(i),
            }
        }

        // Depths top-down so a parent's depth is final before any child reads it
        let mut depths = vec![0usize; spans.len()];
        let mut stack: Vec<usize> = roots.clone();
        while let Some(i) = stack.pop() {
            for &c in &children[i] {
                depths[c] = depths[i] + 1;
                stack.push(c);
            }
        }

        debug!(
            "Span arena: {} spans, {} roots, max depth {}",
            spans.len(),
            roots.len(),
            depths.iter().max().copied().unwrap_or(0)
        );

        Self {
            spans,
            parents,
            children,
            depths,
            roots,
        }
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn span(&self, index: usize) -> &'a Span {
        &self.spans[index]
    }

    pub fn spans(&self) -> &'a [Span] {
        self.spans
    }

    /// Resolved parent of a span, `None` for roots
    pub fn parent(&self, index: usize) -> Option<usize> {
        self.parents[index]
    }

    pub fn children(&self, index: usize) -> &[usize] {
        &self.children[index]
    }

    pub fn depth(&self, index: usize) -> usize {
        self.depths[index]
    }

    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    pub fn max_depth(&self) -> usize {
        self.depths.iter().max().copied().unwrap_or(0)
    }

    /// Indices in pre-order: each root followed by its subtree, siblings in input order
    pub fn preorder(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.spans.len());
        let mut stack: Vec<usize> = self.roots.iter().rev().copied().collect();
        while let Some(i) = stack.pop() {
            order.push(i);
            stack.extend(self.children[i].iter().rev().copied());
        }
        order
    }

    /// Materialize owned tree nodes
    pub fn to_nodes(&self) -> Vec<SpanNode> {
        // Children come after their parent in pre-order, so walking it
        // backwards finishes every subtree before its parent needs it.
        let mut built: Vec<Option<SpanNode>> = vec![None; self.spans.len()];
        for &i in self.preorder().iter().rev() {
            let children = self.children[i]
                .iter()
                .filter_map(|&c| built[c].take())
                .collect();
            built[i] = Some(SpanNode {
                span: self.spans[i].clone(),
                depth: self.depths[i],
                children,
            });
        }

        self.roots.iter().filter_map(|&r| built[r].take()).collect()
    }
}

/// Detach every span that sits on a parent cycle; returns how many were detached
fn break_cycles(parents: &mut [Option<usize>]) -> usize {
    let mut state = vec![Visit::Unseen; parents.len()];
    let mut broken = 0;

    for start in 0..parents.len() {
        if state[start] != Visit::Unseen {
            continue;
        }

        let mut path = Vec::new();
        let mut current = Some(start);
        while let Some(i) = current {
            match state[i] {
                Visit::Done => break,
                Visit::OnPath => {
                    // `i` closes a loop: everything from its position on is the cycle
                    if let Some(pos) = path.iter().position(|&p| p == i) {
                        for &member in &path[pos..] {
                            parents[member] = None;
                            broken += 1;
                        }
                    }
                    break;
                }
                Visit::Unseen => {
                    state[i] = Visit::OnPath;
                    path.push(i);
                    current = parents[i];
                }
            }
        }

        for i in path {
            state[i] = Visit::Done;
        }
    }

    broken
}

/// A span with its materialized subtree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanNode {
    pub span: Span,

    /// Root = 0
    pub depth: usize,

    /// Children in input order
    pub children: Vec<SpanNode>,
}

impl SpanNode {
    /// Pre-order walk of this node and its descendants
    pub fn flatten(&self) -> Vec<&SpanNode> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(node.children.iter().rev());
        }
        out
    }

    /// Number of nodes in this subtree, including self
    pub fn subtree_size(&self) -> usize {
        self.flatten().len()
    }
}

/// Build the span forest
///
/// **Public** - main entry point for tree building
///
/// # Returns
/// Root nodes in input order, each with its subtree
pub fn build_span_tree(spans: &[Span]) -> Vec<SpanNode> {
    SpanArena::build(spans).to_nodes()
}

/// Flatten a forest in pre-order
pub fn flatten_forest(roots: &[SpanNode]) -> Vec<&SpanNode> {
    roots.iter().flat_map(|r| r.flatten()).collect()
}
