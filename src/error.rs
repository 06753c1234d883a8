use std::fmt;
use thiserror::Error;

/// The category of a [`ValidationError`], independent of the node or edge it names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationErrorKind {
    Malformed,
    MissingStart,
    DuplicateStart,
    DuplicateNode,
    UnknownNodeType,
    UnknownKindMapping,
    UnreachableNode,
    DanglingEdge,
    AmbiguousEdge,
    MissingEdge,
    ConditionMismatch,
    InvalidInput,
    PassThroughCycle,
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Errors raised while loading a flow definition into a [`Graph`](crate::graph::Graph).
///
/// Any of these rejects the whole graph; no partially built graph is ever returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Failed to parse flow definition: {0}")]
    Malformed(String),

    #[error("Flow definition has no node of type 'start'")]
    MissingStart,

    #[error("Flow definition declares more than one start node: '{first}' and '{second}'")]
    DuplicateStart { first: String, second: String },

    #[error("Node id '{0}' is declared more than once")]
    DuplicateNode(String),

    #[error("Node '{node_id}' has an unregistered node type: '{type_name}'")]
    UnknownNodeType { node_id: String, type_name: String },

    #[error("Type '{type_name}' is mapped to '{kind_name}', which is not one of start, message, decision, end")]
    UnknownKindMapping { type_name: String, kind_name: String },

    #[error("Node '{0}' cannot be reached from the start node")]
    UnreachableNode(String),

    #[error("Edge #{edge_index} ('{source_id}' -> '{target_id}') references missing node '{missing}'")]
    DanglingEdge {
        edge_index: usize,
        source_id: String,
        target_id: String,
        missing: String,
    },

    #[error("Node '{node_id}' has more than one outgoing edge for {condition}")]
    AmbiguousEdge { node_id: String, condition: String },

    #[error("Node '{0}' has no unconditional outgoing edge to advance along")]
    MissingEdge(String),

    #[error("Outgoing edges of node '{node_id}' do not match its input labels: {message}")]
    ConditionMismatch { node_id: String, message: String },

    #[error("Node '{node_id}' declares an invalid input specification: {message}")]
    InvalidInput { node_id: String, message: String },

    #[error("Nodes {} form a cycle that never waits for input", .0.join(" -> "))]
    PassThroughCycle(Vec<String>),
}

impl ValidationError {
    pub fn kind(&self) -> ValidationErrorKind {
        match self {
            ValidationError::Malformed(_) => ValidationErrorKind::Malformed,
            ValidationError::MissingStart => ValidationErrorKind::MissingStart,
            ValidationError::DuplicateStart { .. } => ValidationErrorKind::DuplicateStart,
            ValidationError::DuplicateNode(_) => ValidationErrorKind::DuplicateNode,
            ValidationError::UnknownNodeType { .. } => ValidationErrorKind::UnknownNodeType,
            ValidationError::UnknownKindMapping { .. } => ValidationErrorKind::UnknownKindMapping,
            ValidationError::UnreachableNode(_) => ValidationErrorKind::UnreachableNode,
            ValidationError::DanglingEdge { .. } => ValidationErrorKind::DanglingEdge,
            ValidationError::AmbiguousEdge { .. } => ValidationErrorKind::AmbiguousEdge,
            ValidationError::MissingEdge(_) => ValidationErrorKind::MissingEdge,
            ValidationError::ConditionMismatch { .. } => ValidationErrorKind::ConditionMismatch,
            ValidationError::InvalidInput { .. } => ValidationErrorKind::InvalidInput,
            ValidationError::PassThroughCycle(_) => ValidationErrorKind::PassThroughCycle,
        }
    }
}

impl From<serde_json::Error> for ValidationError {
    fn from(err: serde_json::Error) -> Self {
        ValidationError::Malformed(err.to_string())
    }
}

impl From<ConversionError> for ValidationError {
    fn from(err: ConversionError) -> Self {
        ValidationError::Malformed(err.to_string())
    }
}

/// Errors that can occur when converting a custom document into a `FlowDefinition`.
#[derive(Error, Debug, Clone)]
pub enum ConversionError {
    #[error("Invalid flow document: {0}")]
    InvalidDocument(String),
}

/// Internal graph inconsistencies met while traversing. Fatal for the session that hit them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("Node '{0}' not found in graph")]
    NodeNotFound(String),

    #[error("Node '{node_id}' has no outgoing edge for resolved label '{label}'")]
    ConditionMismatch { node_id: String, label: String },
}

/// Errors surfaced to callers of the [`Engine`](crate::engine::Engine).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Session '{0}' does not exist")]
    UnknownSession(String),

    #[error("Session '{0}' has already reached the end of the conversation")]
    SessionTerminated(String),

    #[error("Session '{0}' failed and can no longer accept input")]
    SessionFailed(String),

    #[error("Session record '{session_id}' cannot be restored: {message}")]
    InvalidRecord { session_id: String, message: String },
}

/// Failure reported by an external collaborator such as the reply generator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollaboratorError {
    #[error("Collaborator timed out")]
    Timeout,

    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),
}

/// Errors while loading configuration files.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Errors while encoding or decoding a persisted session record.
#[derive(Error, Debug, Clone)]
pub enum RecordError {
    #[error("Serialization failed: {0}")]
    Encode(String),

    #[error("Deserialization failed: {0}")]
    Decode(String),
}
