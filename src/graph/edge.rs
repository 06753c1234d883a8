/// A directed transition between two nodes.
///
/// Edges without a condition are the default way out of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub condition: Option<String>,
}

impl Edge {
    /// Create an unconditional edge.
    pub fn unconditional(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            condition: None,
        }
    }

    /// Create an edge taken when the resolved input label equals `condition`.
    pub fn conditional(
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

    pub fn is_default(&self) -> bool {
        self.condition.is_none()
    }

    pub fn matches(&self, label: &str) -> bool {
        self.condition.as_deref() == Some(label)
    }
}
