//! # Taiwa - Conversational Flow Engine
//!
//! **Taiwa** loads a declarative conversation graph (nodes with templated prompts, typed
//! input and conditional edges), validates it once, and then drives any number of chat
//! sessions through it, one turn per user message.
//!
//! ## Core Workflow
//!
//! 1.  **Load Your Flow**: Pass a JSON flow document to [`load_graph`](compiler::load_graph),
//!     or implement [`IntoFlow`](flow::IntoFlow) for your own format and use
//!     [`GraphCompiler::builder`](compiler::GraphCompiler::builder).
//! 2.  **Validate**: Compilation rejects the whole graph on the first structural problem
//!     (missing start node, unreachable nodes, dangling or ambiguous edges, decision edges that
//!     do not match the declared input).
//! 3.  **Run**: Create an [`Engine`](engine::Engine) over the graph, start sessions and feed
//!     each user message to [`submit_turn`](engine::Engine::submit_turn).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use taiwa::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let definition = std::fs::read("data/diy_repair_flow.json")?;
//!     let graph = load_graph(&definition)?;
//!
//!     let engine = Engine::new(graph);
//!     let session = engine.start_session();
//!
//!     let result = engine.submit_turn(&session, "My chair leg is wobbly")?;
//!     println!("{}", result.output_text);
//!
//!     let result = engine.submit_turn(&session, "Local materials")?;
//!     if let Some(retry) = &result.retry {
//!         println!("Please pick one of {:?}", retry.valid_options);
//!     }
//!     Ok(())
//! }
//! ```

pub mod compiler;
pub mod config;
pub mod engine;
pub mod error;
pub mod flow;
pub mod graph;
pub mod prelude;
pub mod reply;
pub mod resolver;
pub mod session;
pub mod template;
pub mod trace;
