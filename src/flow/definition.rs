/// The complete, canonical definition of a conversation flow, ready for compilation.
/// This is the target structure for any custom document conversion.
#[derive(Debug, Clone, Default)]
pub struct FlowDefinition {
    pub nodes: Vec<FlowNodeDefinition>,
    pub edges: Vec<FlowEdgeDefinition>,
    /// System-level greeting handed to the reply generator, if the document carries one.
    pub opening_statement: Option<String>,
}

/// Defines a single conversational state in the flow.
#[derive(Debug, Clone, Default)]
pub struct FlowNodeDefinition {
    pub id: String,
    /// Free-form type name as written in the document, e.g. `"start"` or `"visual_support"`.
    pub node_type: String,
    pub prompt: Option<String>,
    pub input: Option<InputDefinition>,
    /// Legacy shorthand for a single unconditional edge to the named node.
    pub next_step: Option<String>,
    /// Whether entering this node asks the reply generator for a reply.
    pub generate: bool,
}

/// Declares how a node collects input from the user.
#[derive(Debug, Clone, Default)]
pub struct InputDefinition {
    pub input_type: String,
    pub choices: Vec<String>,
    /// Name of the binding that receives the resolved input.
    pub bind: Option<String>,
    /// Legacy `label -> target` shorthand for conditional edges.
    pub next_step: Vec<(String, String)>,
}

/// Defines a transition between two nodes in the flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowEdgeDefinition {
    pub source: String,
    pub target: String,
    pub condition: Option<String>,
}

impl FlowNodeDefinition {
    pub fn new(id: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            ..Self::default()
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn with_input(mut self, input: InputDefinition) -> Self {
        self.input = Some(input);
        self
    }

    pub fn generating(mut self) -> Self {
        self.generate = true;
        self
    }
}

impl InputDefinition {
    pub fn free_text() -> Self {
        Self {
            input_type: "free_text".to_string(),
            ..Self::default()
        }
    }

    pub fn multiple_choice<I, S>(choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            input_type: "multiple_choice".to_string(),
            choices: choices.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn yes_no() -> Self {
        Self {
            input_type: "yes_no".to_string(),
            ..Self::default()
        }
    }

    pub fn bound_to(mut self, name: impl Into<String>) -> Self {
        self.bind = Some(name.into());
        self
    }
}

impl FlowEdgeDefinition {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            condition: None,
        }
    }

    pub fn when(
        source: impl Into<String>,
        target: impl Into<String>,
        condition: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            condition: Some(condition.into()),
        }
    }
}
