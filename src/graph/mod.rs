//! The validated, read-only conversation graph.
//!
//! A `Graph` is only ever produced by the [`GraphCompiler`](crate::compiler::GraphCompiler),
//! which checks every structural invariant first. After that it is shared between all
//! sessions and never mutated.

pub mod edge;
pub mod node;
pub mod visualizer;

pub use edge::Edge;
pub use node::{InputSpec, Node, NodeKind};

use crate::error::ExecutionError;
use ahash::AHashMap;

#[derive(Debug, Clone)]
pub struct Graph {
    nodes: AHashMap<String, Node>,
    /// Node ids in declaration order.
    order: Vec<String>,
    edges: Vec<Edge>,
    /// Indices into `edges`, per source node, in declaration order.
    outgoing: AHashMap<String, Vec<usize>>,
    start: String,
    opening_statement: Option<String>,
}

impl Graph {
    pub(crate) fn new(
        nodes: Vec<Node>,
        edges: Vec<Edge>,
        start: String,
        opening_statement: Option<String>,
    ) -> Self {
        let order = nodes.iter().map(|n| n.id.clone()).collect();
        let mut outgoing: AHashMap<String, Vec<usize>> = AHashMap::new();
        for (index, edge) in edges.iter().enumerate() {
            outgoing.entry(edge.source.clone()).or_default().push(index);
        }
        Self {
            nodes: nodes.into_iter().map(|n| (n.id.clone(), n)).collect(),
            order,
            edges,
            outgoing,
            start,
            opening_statement,
        }
    }

    pub fn start_id(&self) -> &str {
        &self.start
    }

    pub fn opening_statement(&self) -> Option<&str> {
        self.opening_statement.as_deref()
    }

    pub fn node(&self, node_id: &str) -> Result<&Node, ExecutionError> {
        self.nodes
            .get(node_id)
            .ok_or_else(|| ExecutionError::NodeNotFound(node_id.to_string()))
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.nodes.contains_key(node_id)
    }

    /// Outgoing edges of `node_id` in declaration order.
    pub fn outgoing_edges(&self, node_id: &str) -> Vec<&Edge> {
        self.outgoing
            .get(node_id)
            .map(|indices| indices.iter().map(|&i| &self.edges[i]).collect())
            .unwrap_or_default()
    }

    /// The first unconditional edge out of `node_id`.
    pub fn default_edge(&self, node_id: &str) -> Option<&Edge> {
        self.outgoing_edges(node_id)
            .into_iter()
            .find(|e| e.is_default())
    }

    /// The first edge out of `node_id` whose condition equals `label`.
    pub fn edge_for_label(&self, node_id: &str, label: &str) -> Option<&Edge> {
        self.outgoing_edges(node_id)
            .into_iter()
            .find(|e| e.matches(label))
    }

    /// Nodes in declaration order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
