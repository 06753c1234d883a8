use super::conversion::IntoFlow;
use super::definition::{FlowDefinition, FlowEdgeDefinition, FlowNodeDefinition, InputDefinition};
use crate::error::{ConversionError, ValidationError};
use serde::Deserialize;
use std::collections::BTreeMap;

// --- JSON Deserialization Structs (Input Format Specific) ---
// Two layouts are accepted: a flat `{ nodes, edges }` document, and the workflow export
// layout where the graph sits under `workflow.graph` and node fields live under `data`.

/// A flow document as found on disk, in either supported layout.
#[derive(Debug)]
pub enum FlowDocument {
    Flat(FlatDocument),
    Export(ExportDocument),
}

#[derive(Debug, Deserialize)]
pub struct FlatDocument {
    pub nodes: Vec<RawNode>,
    #[serde(default)]
    pub edges: Vec<RawEdge>,
    #[serde(default, alias = "openingStatement")]
    pub opening_statement: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExportDocument {
    #[serde(default)]
    pub name: Option<String>,
    pub workflow: RawWorkflow,
}

#[derive(Debug, Deserialize)]
pub struct RawWorkflow {
    pub graph: RawGraph,
    #[serde(default)]
    pub features: RawFeatures,
}

#[derive(Debug, Deserialize)]
pub struct RawGraph {
    pub nodes: Vec<RawNode>,
    #[serde(default)]
    pub edges: Vec<RawEdge>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawFeatures {
    #[serde(default)]
    pub opening_statement: Option<String>,
}

/// A node in either layout. Top-level fields take precedence over the nested `data` object.
#[derive(Debug, Deserialize)]
pub struct RawNode {
    pub id: String,
    #[serde(default, rename = "type")]
    pub node_type: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub input: Option<RawInput>,
    #[serde(default)]
    pub next_step: Option<String>,
    #[serde(default)]
    pub generate: Option<bool>,
    #[serde(default)]
    pub data: Option<RawNodeData>,
}

#[derive(Debug, Deserialize)]
pub struct RawNodeData {
    #[serde(default, rename = "type")]
    pub node_type: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub input: Option<RawInput>,
    #[serde(default)]
    pub next_step: Option<String>,
    #[serde(default)]
    pub generate: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct RawInput {
    #[serde(rename = "type")]
    pub input_type: String,
    #[serde(default)]
    pub choices: Vec<String>,
    #[serde(default)]
    pub bind: Option<String>,
    #[serde(default)]
    pub next_step: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct RawEdge {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub data: Option<RawEdgeData>,
}

#[derive(Debug, Deserialize)]
pub struct RawEdgeData {
    #[serde(default)]
    pub condition: Option<String>,
}

impl FlowDocument {
    /// Parses a JSON document, picking the layout by the presence of a `workflow` key.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ValidationError> {
        let value: serde_json::Value = serde_json::from_slice(bytes)?;
        if value.get("workflow").is_some() {
            Ok(FlowDocument::Export(serde_json::from_value(value)?))
        } else {
            Ok(FlowDocument::Flat(serde_json::from_value(value)?))
        }
    }
}

// --- Converter Implementation ---

impl IntoFlow for FlowDocument {
    fn into_flow(self) -> Result<FlowDefinition, ConversionError> {
        let (nodes, edges, opening_statement) = match self {
            FlowDocument::Flat(doc) => (doc.nodes, doc.edges, doc.opening_statement),
            FlowDocument::Export(doc) => (
                doc.workflow.graph.nodes,
                doc.workflow.graph.edges,
                doc.workflow.features.opening_statement,
            ),
        };

        let nodes = nodes
            .into_iter()
            .map(convert_node)
            .collect::<Result<Vec<_>, _>>()?;

        let edges = edges
            .into_iter()
            .map(|raw_edge| {
                let condition = raw_edge
                    .condition
                    .or_else(|| raw_edge.data.and_then(|data| data.condition));
                FlowEdgeDefinition {
                    source: raw_edge.source,
                    target: raw_edge.target,
                    condition,
                }
            })
            .collect();

        Ok(FlowDefinition {
            nodes,
            edges,
            opening_statement,
        })
    }
}

fn convert_node(raw: RawNode) -> Result<FlowNodeDefinition, ConversionError> {
    let data = raw.data;
    let (data_type, data_prompt, data_input, data_next, data_generate) = match data {
        Some(d) => (d.node_type, d.prompt, d.input, d.next_step, d.generate),
        None => (None, None, None, None, None),
    };

    let node_type = raw.node_type.or(data_type).ok_or_else(|| {
        ConversionError::InvalidDocument(format!("node '{}' has no type", raw.id))
    })?;

    // Export documents mark model-backed steps with an `llm` type instead of a flag.
    let generate = raw
        .generate
        .or(data_generate)
        .unwrap_or(node_type == "llm");

    let input = raw.input.or(data_input).map(|input| InputDefinition {
        input_type: input.input_type,
        choices: input.choices,
        bind: input.bind,
        next_step: input.next_step.into_iter().collect(),
    });

    Ok(FlowNodeDefinition {
        id: raw.id,
        node_type,
        prompt: raw.prompt.or(data_prompt),
        input,
        next_step: raw.next_step.or(data_next),
        generate,
    })
}
