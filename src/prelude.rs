//! Prelude module for convenient imports
//!
//! Re-exports the types most programs need to load a flow and run sessions against it.
//!
//! # Example
//!
//! ```rust,no_run
//! use taiwa::prelude::*;
//!
//! # fn run_example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::from_file("taiwa.toml")?;
//! let definition = std::fs::read("path/to/flow.json")?;
//! let graph = load_graph_with(&definition, &config.compiler)?;
//!
//! let engine = Engine::builder(graph).with_config(config.engine).build();
//! let session = engine.start_session();
//! let result = engine.submit_turn(&session, "hello")?;
//! println!("{}", TraceFormatter::format_turn(&result));
//! # Ok(())
//! # }
//! ```

// Loading and compiling flows
pub use crate::compiler::{GraphCompiler, load_graph, load_graph_with};
pub use crate::flow::{
    FlowDefinition, FlowEdgeDefinition, FlowNodeDefinition, InputDefinition, IntoFlow,
};

// The compiled graph
pub use crate::graph::{Edge, Graph, InputSpec, Node, NodeKind};

// Running sessions
pub use crate::engine::{Engine, TurnResult};
pub use crate::reply::{ChatMessage, ReplyGenerator, ReplyRequest, Role};
pub use crate::resolver::{RetryReason, RetryRequest};
pub use crate::session::{Session, SessionRecord, SessionStatus};
pub use crate::template::UnresolvedPlaceholder;

// Configuration
pub use crate::config::{CompilerOptions, Config, EngineConfig};

// Error types
pub use crate::error::{
    CollaboratorError, EngineError, ExecutionError, ValidationError, ValidationErrorKind,
};

// Trace formatting
pub use crate::trace::TraceFormatter;
