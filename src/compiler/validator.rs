use crate::error::ValidationError;
use crate::graph::{Edge, Node, NodeKind};
use ahash::{AHashMap, AHashSet};
use itertools::Itertools;
use std::collections::VecDeque;

/// Checks the structural invariants of a lowered graph.
///
/// Checks run in a fixed order and the first failure is reported, so the same
/// malformed document always produces the same error.
pub(super) struct GraphValidator<'a> {
    nodes: AHashMap<&'a str, &'a Node>,
    order: &'a [Node],
    edges: &'a [Edge],
    start: &'a str,
}

impl<'a> GraphValidator<'a> {
    pub(super) fn new(nodes: &'a [Node], edges: &'a [Edge], start: &'a str) -> Self {
        Self {
            nodes: nodes.iter().map(|n| (n.id.as_str(), n)).collect(),
            order: nodes,
            edges,
            start,
        }
    }

    pub(super) fn validate(&self) -> Result<(), ValidationError> {
        self.check_dangling_edges()?;
        for node in self.order {
            self.check_outgoing(node)?;
        }
        self.check_reachability()?;
        self.check_pass_through_cycles()
    }

    fn outgoing(&self, node_id: &str) -> impl Iterator<Item = &'a Edge> {
        let node_id = node_id.to_string();
        self.edges.iter().filter(move |e| e.source == node_id)
    }

    fn check_dangling_edges(&self) -> Result<(), ValidationError> {
        for (edge_index, edge) in self.edges.iter().enumerate() {
            for endpoint in [&edge.source, &edge.target] {
                if !self.nodes.contains_key(endpoint.as_str()) {
                    return Err(ValidationError::DanglingEdge {
                        edge_index,
                        source_id: edge.source.clone(),
                        target_id: edge.target.clone(),
                        missing: endpoint.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn check_outgoing(&self, node: &Node) -> Result<(), ValidationError> {
        let edges: Vec<&Edge> = self.outgoing(&node.id).collect();
        let defaults = edges.iter().filter(|e| e.is_default()).count();
        let conditions: Vec<&str> = edges
            .iter()
            .filter_map(|e| e.condition.as_deref())
            .collect();

        let mismatch = |message: String| ValidationError::ConditionMismatch {
            node_id: node.id.clone(),
            message,
        };

        if defaults > 1 {
            return Err(ValidationError::AmbiguousEdge {
                node_id: node.id.clone(),
                condition: "the default transition".to_string(),
            });
        }
        if let Some(label) = conditions.iter().duplicates().next() {
            return Err(ValidationError::AmbiguousEdge {
                node_id: node.id.clone(),
                condition: format!("condition '{}'", label),
            });
        }

        match node.kind {
            NodeKind::End => {
                if !edges.is_empty() {
                    return Err(mismatch("end nodes cannot have outgoing edges".to_string()));
                }
            }
            NodeKind::Start | NodeKind::Message => {
                if !conditions.is_empty() {
                    return Err(mismatch(format!(
                        "only decision nodes may branch, found conditions: {}",
                        conditions.iter().join(", ")
                    )));
                }
                if defaults == 0 {
                    return Err(ValidationError::MissingEdge(node.id.clone()));
                }
            }
            NodeKind::Decision => {
                let labels = node
                    .input
                    .as_ref()
                    .map(|input| input.labels())
                    .unwrap_or_default();

                if labels.is_empty() {
                    if !conditions.is_empty() {
                        return Err(mismatch(format!(
                            "free-text input has no labels, found conditions: {}",
                            conditions.iter().join(", ")
                        )));
                    }
                    if defaults == 0 {
                        return Err(ValidationError::MissingEdge(node.id.clone()));
                    }
                    return Ok(());
                }

                if defaults > 0 {
                    return Err(mismatch(
                        "an unconditional edge can never be taken from a labelled input"
                            .to_string(),
                    ));
                }
                let missing: Vec<&str> = labels
                    .iter()
                    .filter(|l| !conditions.contains(*l))
                    .copied()
                    .collect();
                let unexpected: Vec<&str> = conditions
                    .iter()
                    .filter(|c| !labels.contains(*c))
                    .copied()
                    .collect();
                if !missing.is_empty() || !unexpected.is_empty() {
                    return Err(mismatch(format!(
                        "missing [{}], unexpected [{}]",
                        missing.iter().join(", "),
                        unexpected.iter().join(", ")
                    )));
                }
            }
        }
        Ok(())
    }

    /// Breadth-first walk from the start node. Cycles are fine; unreached `end` nodes too.
    fn check_reachability(&self) -> Result<(), ValidationError> {
        let mut reached: AHashSet<&str> = AHashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        reached.insert(self.start);
        queue.push_back(self.start);

        while let Some(current) = queue.pop_front() {
            for edge in self.outgoing(current) {
                if reached.insert(edge.target.as_str()) {
                    queue.push_back(edge.target.as_str());
                }
            }
        }

        match self
            .order
            .iter()
            .find(|n| n.kind != NodeKind::End && !reached.contains(n.id.as_str()))
        {
            Some(node) => Err(ValidationError::UnreachableNode(node.id.clone())),
            None => Ok(()),
        }
    }

    /// Rejects loops made only of nodes that never wait for input, since one turn
    /// would otherwise never finish.
    fn check_pass_through_cycles(&self) -> Result<(), ValidationError> {
        for node in self.order {
            if !self.passes_through(node) {
                continue;
            }
            let mut path: Vec<&str> = vec![node.id.as_str()];
            let mut current = node;
            while let Some(edge) = self.outgoing(&current.id).find(|e| e.is_default()) {
                let Some(&next) = self.nodes.get(edge.target.as_str()) else {
                    break;
                };
                if !self.passes_through(next) {
                    break;
                }
                if let Some(pos) = path.iter().position(|id| *id == next.id) {
                    let mut cycle: Vec<String> =
                        path[pos..].iter().map(|s| s.to_string()).collect();
                    cycle.push(next.id.clone());
                    return Err(ValidationError::PassThroughCycle(cycle));
                }
                path.push(next.id.as_str());
                current = next;
            }
        }
        Ok(())
    }

    fn passes_through(&self, node: &Node) -> bool {
        node.kind != NodeKind::End && !node.suspends()
    }
}
