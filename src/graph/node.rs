use crate::template::Template;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of node behaviours the engine knows how to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Pass-through entry point. Never emits a prompt.
    Start,
    /// Emits a prompt and advances along its default edge.
    Message,
    /// Emits a prompt and waits for input that selects a conditional edge.
    Decision,
    /// Emits a closing prompt and terminates the session.
    End,
}

impl NodeKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "start" => Some(NodeKind::Start),
            "message" => Some(NodeKind::Message),
            "decision" => Some(NodeKind::Decision),
            "end" => Some(NodeKind::End),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Start => "start",
            NodeKind::Message => "message",
            NodeKind::Decision => "decision",
            NodeKind::End => "end",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a node interprets the user's reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSpec {
    FreeText,
    /// Ordered choice labels; a reply must match one of them.
    MultipleChoice(Vec<String>),
    YesNo,
}

impl InputSpec {
    /// Labels an outgoing edge condition may carry for this input.
    pub fn labels(&self) -> Vec<&str> {
        match self {
            InputSpec::FreeText => Vec::new(),
            InputSpec::MultipleChoice(choices) => choices.iter().map(String::as_str).collect(),
            InputSpec::YesNo => vec!["yes", "no"],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            InputSpec::FreeText => "free_text",
            InputSpec::MultipleChoice(_) => "multiple_choice",
            InputSpec::YesNo => "yes_no",
        }
    }
}

/// A compiled, immutable conversational state.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    /// The type name the document used, kept for diagnostics.
    pub type_name: String,
    pub prompt: Option<Template>,
    pub input: Option<InputSpec>,
    /// Binding that receives this node's resolved input.
    pub binding: String,
    pub generate: bool,
}

impl Node {
    /// Whether the engine stops at this node and waits for the next turn.
    pub fn suspends(&self) -> bool {
        match self.kind {
            NodeKind::Decision => true,
            NodeKind::Message => self.input.is_some(),
            NodeKind::Start | NodeKind::End => false,
        }
    }

    pub fn default_binding(node_id: &str) -> String {
        format!("{}_response", node_id)
    }
}
