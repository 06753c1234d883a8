use super::definition::FlowDefinition;
use crate::error::ConversionError;

/// A trait for custom data models that can be converted into a Taiwa `FlowDefinition`.
///
/// This is the extension point that keeps the compiler format-agnostic. Implement it on
/// your own document structs to feed them to [`GraphCompiler`](crate::compiler::GraphCompiler).
///
/// # Example
///
/// ```rust,no_run
/// use taiwa::prelude::*;
/// use taiwa::error::ConversionError;
///
/// struct Step { id: String, kind: String, text: String }
/// struct Script { steps: Vec<Step> }
///
/// impl IntoFlow for Script {
///     fn into_flow(self) -> Result<FlowDefinition, ConversionError> {
///         let mut flow = FlowDefinition::default();
///         for pair in self.steps.windows(2) {
///             flow.edges.push(FlowEdgeDefinition::new(pair[0].id.clone(), pair[1].id.clone()));
///         }
///         for step in self.steps {
///             flow.nodes.push(FlowNodeDefinition::new(step.id, step.kind).with_prompt(step.text));
///         }
///         Ok(flow)
///     }
/// }
/// ```
pub trait IntoFlow {
    /// Consumes the object and converts it into a Taiwa-compatible flow.
    fn into_flow(self) -> Result<FlowDefinition, ConversionError>;
}

impl IntoFlow for FlowDefinition {
    fn into_flow(self) -> Result<FlowDefinition, ConversionError> {
        Ok(self)
    }
}
