use super::parsing::KindRegistry;
use crate::error::ValidationError;
use crate::flow::{FlowDefinition, FlowNodeDefinition, InputDefinition};
use crate::graph::{Edge, InputSpec, Node, NodeKind};
use crate::template::Template;
use ahash::AHashSet;
use itertools::Itertools;

/// Nodes and edges lowered from a `FlowDefinition`, not yet validated.
pub(super) struct LoweredFlow {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub start: String,
}

/// Lowers document-level definitions into typed nodes and a uniform edge list.
pub(super) struct GraphBuilder<'a> {
    flow: &'a FlowDefinition,
    registry: &'a KindRegistry,
}

impl<'a> GraphBuilder<'a> {
    pub(super) fn new(flow: &'a FlowDefinition, registry: &'a KindRegistry) -> Self {
        Self { flow, registry }
    }

    pub(super) fn lower(&self) -> Result<LoweredFlow, ValidationError> {
        let mut seen: AHashSet<&str> = AHashSet::new();
        let mut start: Option<String> = None;
        let mut nodes = Vec::with_capacity(self.flow.nodes.len());

        for definition in &self.flow.nodes {
            if !seen.insert(definition.id.as_str()) {
                return Err(ValidationError::DuplicateNode(definition.id.clone()));
            }
            let node = self.lower_node(definition)?;
            if node.kind == NodeKind::Start {
                if let Some(first) = &start {
                    return Err(ValidationError::DuplicateStart {
                        first: first.clone(),
                        second: node.id.clone(),
                    });
                }
                start = Some(node.id.clone());
            }
            nodes.push(node);
        }

        let start = start.ok_or(ValidationError::MissingStart)?;
        Ok(LoweredFlow {
            nodes,
            edges: self.normalize_edges(),
            start,
        })
    }

    fn lower_node(&self, definition: &FlowNodeDefinition) -> Result<Node, ValidationError> {
        let kind = self.registry.resolve(definition)?;
        let input = match &definition.input {
            Some(input) => Some(parse_input(&definition.id, input)?),
            None => None,
        };

        match (kind, &input) {
            (NodeKind::Decision, None) => {
                return Err(ValidationError::InvalidInput {
                    node_id: definition.id.clone(),
                    message: "decision nodes must declare an input".to_string(),
                });
            }
            (NodeKind::Start | NodeKind::End, Some(_)) => {
                return Err(ValidationError::InvalidInput {
                    node_id: definition.id.clone(),
                    message: format!("{} nodes cannot collect input", kind),
                });
            }
            _ => {}
        }

        let binding = definition
            .input
            .as_ref()
            .and_then(|i| i.bind.clone())
            .unwrap_or_else(|| Node::default_binding(&definition.id));

        Ok(Node {
            id: definition.id.clone(),
            kind,
            type_name: definition.node_type.clone(),
            prompt: definition.prompt.as_deref().map(Template::parse),
            input,
            binding,
            generate: definition.generate,
        })
    }

    /// Folds the legacy `next_step` shorthands into the edge list.
    ///
    /// Declared edges come first, in declaration order. Shorthand edges follow in node
    /// order and are dropped when an identical edge was already declared.
    fn normalize_edges(&self) -> Vec<Edge> {
        let mut edges: Vec<Edge> = self
            .flow
            .edges
            .iter()
            .map(|e| Edge {
                source: e.source.clone(),
                target: e.target.clone(),
                condition: e.condition.clone(),
            })
            .collect();

        for node in &self.flow.nodes {
            let mut implied = Vec::new();
            if let Some(target) = &node.next_step {
                implied.push(Edge::unconditional(node.id.clone(), target.clone()));
            }
            if let Some(input) = &node.input {
                for (label, target) in &input.next_step {
                    implied.push(Edge::conditional(
                        node.id.clone(),
                        target.clone(),
                        label.clone(),
                    ));
                }
            }
            for edge in implied {
                if !edges.contains(&edge) {
                    edges.push(edge);
                }
            }
        }
        edges
    }
}

fn parse_input(node_id: &str, input: &InputDefinition) -> Result<InputSpec, ValidationError> {
    let invalid = |message: String| ValidationError::InvalidInput {
        node_id: node_id.to_string(),
        message,
    };

    match input.input_type.as_str() {
        "free_text" | "text" => Ok(InputSpec::FreeText),
        "yes_no" => Ok(InputSpec::YesNo),
        "multiple_choice" => {
            if input.choices.is_empty() {
                return Err(invalid("multiple_choice requires at least one choice".into()));
            }
            let duplicates: Vec<&String> = input
                .choices
                .iter()
                .duplicates_by(|c| crate::resolver::normalize(c))
                .collect();
            if !duplicates.is_empty() {
                return Err(invalid(format!(
                    "duplicate choices: {}",
                    duplicates.iter().join(", ")
                )));
            }
            Ok(InputSpec::MultipleChoice(input.choices.clone()))
        }
        other => Err(invalid(format!("unknown input type '{}'", other))),
    }
}
