use crate::config::CompilerOptions;
use crate::error::ValidationError;
use crate::flow::{FlowDefinition, FlowDocument, IntoFlow};
use crate::graph::Graph;
use tracing::debug;

mod builder;
pub mod parsing;
mod validator;

use builder::GraphBuilder;
use parsing::KindRegistry;
use validator::GraphValidator;

/// Turns a `FlowDefinition` into a validated, immutable [`Graph`].
pub struct GraphCompiler {
    flow: FlowDefinition,
    registry: KindRegistry,
}

pub struct GraphCompilerBuilder {
    flow: FlowDefinition,
    registry: KindRegistry,
}

impl GraphCompilerBuilder {
    pub fn new(flow: FlowDefinition) -> Self {
        Self {
            flow,
            registry: KindRegistry::new(),
        }
    }

    /// Treats nodes of `user_type_name` as the canonical kind `kind_name`
    /// (`start`, `message`, `decision` or `end`).
    pub fn with_type_mapping(mut self, user_type_name: &str, kind_name: &str) -> Self {
        self.registry.map(user_type_name, kind_name);
        self
    }

    /// Lets unmapped type names fall back to a kind derived from their input spec.
    pub fn infer_kinds(mut self, infer: bool) -> Self {
        self.registry.set_inference(infer);
        self
    }

    pub fn with_options(mut self, options: &CompilerOptions) -> Self {
        for (user_type_name, kind_name) in &options.type_mappings {
            self.registry.map(user_type_name, kind_name);
        }
        self.registry.set_inference(options.infer_kinds);
        self
    }

    pub fn build(self) -> GraphCompiler {
        GraphCompiler {
            flow: self.flow,
            registry: self.registry,
        }
    }
}

impl GraphCompiler {
    pub fn builder(flow: FlowDefinition) -> GraphCompilerBuilder {
        GraphCompilerBuilder::new(flow)
    }

    /// Lowers and validates the flow. Either the whole graph is returned or nothing is.
    pub fn compile(self) -> Result<Graph, ValidationError> {
        self.registry.check_mappings()?;
        let lowered = GraphBuilder::new(&self.flow, &self.registry).lower()?;
        GraphValidator::new(&lowered.nodes, &lowered.edges, &lowered.start).validate()?;

        debug!(
            nodes = lowered.nodes.len(),
            edges = lowered.edges.len(),
            start = %lowered.start,
            "Flow graph compiled"
        );

        Ok(Graph::new(
            lowered.nodes,
            lowered.edges,
            lowered.start,
            self.flow.opening_statement,
        ))
    }
}

/// Parses and compiles a JSON flow document with the default [`CompilerOptions`].
pub fn load_graph(definition: &[u8]) -> Result<Graph, ValidationError> {
    load_graph_with(definition, &CompilerOptions::default())
}

/// Parses and compiles a JSON flow document.
pub fn load_graph_with(
    definition: &[u8],
    options: &CompilerOptions,
) -> Result<Graph, ValidationError> {
    let flow = FlowDocument::from_slice(definition)?.into_flow()?;
    GraphCompiler::builder(flow).with_options(options).build().compile()
}
