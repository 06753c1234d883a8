use crate::error::ValidationError;
use crate::flow::FlowNodeDefinition;
use crate::graph::NodeKind;
use ahash::AHashMap;

/// Maps the free-form type names of a flow document onto the closed [`NodeKind`] set.
pub struct KindRegistry {
    mappings: AHashMap<String, NodeKind>,
    rejected: Vec<(String, String)>,
    infer: bool,
}

impl KindRegistry {
    /// A registry that knows only the canonical names `start`, `message`, `decision`, `end`.
    pub fn new() -> Self {
        let mut mappings = AHashMap::new();
        for kind in [
            NodeKind::Start,
            NodeKind::Message,
            NodeKind::Decision,
            NodeKind::End,
        ] {
            mappings.insert(kind.as_str().to_string(), kind);
        }
        Self {
            mappings,
            rejected: Vec::new(),
            infer: false,
        }
    }

    /// Registers `user_type_name` as an alias of a canonical kind name.
    /// Unknown canonical names are held back and reported by [`Self::check_mappings`].
    pub fn map(&mut self, user_type_name: &str, kind_name: &str) {
        match NodeKind::from_name(kind_name) {
            Some(kind) => {
                self.mappings.insert(user_type_name.to_string(), kind);
            }
            None => self
                .rejected
                .push((user_type_name.to_string(), kind_name.to_string())),
        }
    }

    /// Fails on the first mapping whose kind name was not recognised.
    pub fn check_mappings(&self) -> Result<(), ValidationError> {
        match self.rejected.first() {
            Some((type_name, kind_name)) => Err(ValidationError::UnknownKindMapping {
                type_name: type_name.clone(),
                kind_name: kind_name.clone(),
            }),
            None => Ok(()),
        }
    }

    pub fn set_inference(&mut self, infer: bool) {
        self.infer = infer;
    }

    pub fn resolve(&self, node: &FlowNodeDefinition) -> Result<NodeKind, ValidationError> {
        if let Some(kind) = self.mappings.get(&node.node_type) {
            return Ok(*kind);
        }
        if self.infer {
            return Ok(infer_kind(node));
        }
        Err(ValidationError::UnknownNodeType {
            node_id: node.id.clone(),
            type_name: node.node_type.clone(),
        })
    }
}

impl Default for KindRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Nodes asking a yes/no question branch; everything else talks and moves on.
fn infer_kind(node: &FlowNodeDefinition) -> NodeKind {
    match &node.input {
        Some(input) if input.input_type == "yes_no" => NodeKind::Decision,
        _ => NodeKind::Message,
    }
}
