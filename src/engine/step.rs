use super::TurnResult;
use super::store::SessionSlot;
use crate::config::EngineConfig;
use crate::error::{CollaboratorError, ExecutionError};
use crate::graph::{Edge, Graph, Node, NodeKind};
use crate::reply::{ChatMessage, ReplyGenerator, ReplyRequest, Role, extract_labeled_fields};
use crate::resolver::{InputResolver, Resolution, RetryReason, RetryRequest};
use crate::template::UnresolvedPlaceholder;
use tracing::{debug, info, warn};

pub(super) enum StepOutcome {
    Completed(TurnResult),
    /// The reply generator failed. The caller rolls the session back.
    CollaboratorFailed {
        node_id: String,
        error: CollaboratorError,
    },
}

/// Runs one turn of one session: resolve the pending input, then walk the graph until a node
/// suspends or the conversation ends.
pub(super) struct TurnRunner<'a> {
    graph: &'a Graph,
    config: &'a EngineConfig,
    generator: Option<&'a dyn ReplyGenerator>,
    slot: &'a mut SessionSlot,
    outputs: Vec<String>,
    warnings: Vec<UnresolvedPlaceholder>,
    visited: Vec<String>,
    input_logged: bool,
}

impl<'a> TurnRunner<'a> {
    pub(super) fn new(
        graph: &'a Graph,
        config: &'a EngineConfig,
        generator: Option<&'a dyn ReplyGenerator>,
        slot: &'a mut SessionSlot,
    ) -> Self {
        Self {
            graph,
            config,
            generator,
            slot,
            outputs: Vec::new(),
            warnings: Vec::new(),
            visited: Vec::new(),
            input_logged: false,
        }
    }

    pub(super) fn run(mut self, input: &str) -> Result<StepOutcome, ExecutionError> {
        let input = input.trim();
        self.slot.session.turn += 1;
        self.slot
            .session
            .bind(self.config.input_binding.clone(), input.to_string());

        let graph = self.graph;
        let current = graph.node(&self.slot.session.current_node)?;

        if !self.slot.session.awaiting_input {
            // Fresh sessions and loop-backs take the input as free-form contact.
            if self.config.is_off_topic(input) {
                let retry = RetryRequest::new(
                    &current.id,
                    RetryReason::OffTopic,
                    &self.config.off_topic_reply,
                );
                self.outputs.push(self.config.off_topic_reply.clone());
                return Ok(self.retry(retry));
            }
            return self.traverse(current.id.clone(), input);
        }

        let resolution = match InputResolver::resolve(current, input) {
            Resolution::Resolved(resolved)
                if resolved.label.is_none() && self.config.is_off_topic(input) =>
            {
                Resolution::Retry(RetryRequest::new(
                    &current.id,
                    RetryReason::OffTopic,
                    &self.config.off_topic_reply,
                ))
            }
            other => other,
        };

        match resolution {
            Resolution::Retry(retry) => {
                self.emit_prompt(current);
                self.outputs.push(retry.guidance.clone());
                Ok(self.retry(retry))
            }
            Resolution::Resolved(resolved) => {
                debug!(
                    session_id = %self.slot.session.id,
                    node_id = %current.id,
                    label = ?resolved.label,
                    "Input resolved"
                );
                self.slot.session.bind(resolved.binding, resolved.value);
                self.slot.session.awaiting_input = false;

                let label = match current.kind {
                    NodeKind::Decision => resolved.label,
                    _ => None,
                };
                let edge = self.exit_edge(current, label.as_deref())?;
                let target = edge.target.clone();
                self.traverse(target, input)
            }
        }
    }

    fn traverse(mut self, mut cursor: String, input: &str) -> Result<StepOutcome, ExecutionError> {
        let graph = self.graph;
        loop {
            let node = graph.node(&cursor)?;
            self.visited.push(node.id.clone());
            self.slot.session.current_node = node.id.clone();
            debug!(
                session_id = %self.slot.session.id,
                node_id = %node.id,
                kind = %node.kind,
                turn = self.slot.session.turn,
                "Entering node"
            );

            match node.kind {
                NodeKind::Start => {
                    self.apply_initial_bindings();
                }
                NodeKind::Message => {
                    let reply = match self.generate(node, input) {
                        Ok(reply) => reply,
                        Err(error) => {
                            return Ok(StepOutcome::CollaboratorFailed {
                                node_id: node.id.clone(),
                                error,
                            });
                        }
                    };
                    if node.prompt.is_some() {
                        self.emit_prompt(node);
                    } else if let Some(reply) = reply {
                        self.outputs.push(reply);
                    }
                    if node.suspends() {
                        self.slot.session.awaiting_input = true;
                        break;
                    }
                }
                NodeKind::Decision => {
                    self.emit_prompt(node);
                    self.slot.session.awaiting_input = true;
                    break;
                }
                NodeKind::End => {
                    self.emit_prompt(node);
                    self.slot.session.terminal = true;
                    self.slot.session.awaiting_input = false;
                    info!(
                        session_id = %self.slot.session.id,
                        node_id = %node.id,
                        turn = self.slot.session.turn,
                        "Session reached the end of the conversation"
                    );
                    break;
                }
            }

            cursor = self.exit_edge(node, None)?.target.clone();
        }

        Ok(StepOutcome::Completed(self.finish(None)))
    }

    /// The edge selected by `label`, or the default edge when there is none.
    fn exit_edge(&self, node: &Node, label: Option<&str>) -> Result<&'a Edge, ExecutionError> {
        let graph = self.graph;
        let edge = match label {
            Some(label) => graph.edge_for_label(&node.id, label),
            None => graph.default_edge(&node.id),
        };
        edge.ok_or_else(|| ExecutionError::ConditionMismatch {
            node_id: node.id.clone(),
            label: label.unwrap_or("default").to_string(),
        })
    }

    fn apply_initial_bindings(&mut self) {
        for (name, value) in &self.config.initial_bindings {
            if !self.slot.session.bindings.contains_key(name) {
                self.slot.session.bind(name.clone(), value.clone());
            }
        }
    }

    /// Calls the reply generator for `generate` nodes. `Ok(None)` when there is nothing to call.
    fn generate(&mut self, node: &Node, input: &str) -> Result<Option<String>, CollaboratorError> {
        let Some(generator) = self.generator.filter(|_| node.generate) else {
            return Ok(None);
        };

        let mut messages = Vec::with_capacity(self.slot.history.len() + 2);
        let opening = self
            .config
            .opening_statement
            .as_deref()
            .or(self.graph.opening_statement());
        if let Some(opening) = opening {
            messages.push(ChatMessage::new(Role::System, opening));
        }
        messages.extend(self.slot.history.messages().cloned());
        messages.push(ChatMessage::new(Role::User, input));

        let request = ReplyRequest {
            session_id: self.slot.session.id.clone(),
            node_id: node.id.clone(),
            messages,
        };
        let reply = generator.generate(&request)?;

        if !self.input_logged {
            self.slot.history.push(ChatMessage::new(Role::User, input));
            self.input_logged = true;
        }
        self.slot
            .history
            .push(ChatMessage::new(Role::Assistant, reply.clone()));

        self.slot
            .session
            .bind(self.config.reply_binding.clone(), reply.clone());
        for (name, value) in extract_labeled_fields(&reply) {
            self.slot.session.bind(name, value);
        }
        Ok(Some(reply))
    }

    fn emit_prompt(&mut self, node: &Node) {
        let Some(prompt) = &node.prompt else {
            return;
        };
        let rendered = prompt.render(&self.slot.session.bindings);
        if !rendered.warnings.is_empty() {
            let names: Vec<&str> = rendered.warnings.iter().map(|w| w.name.as_str()).collect();
            warn!(
                session_id = %self.slot.session.id,
                node_id = %node.id,
                placeholders = ?names,
                "Prompt rendered with unresolved placeholders"
            );
        }
        for warning in rendered.warnings {
            if !self.warnings.contains(&warning) {
                self.warnings.push(warning);
            }
        }
        if !rendered.text.trim().is_empty() {
            self.outputs.push(rendered.text);
        }
    }

    fn retry(self, retry: RetryRequest) -> StepOutcome {
        warn!(
            session_id = %self.slot.session.id,
            node_id = %retry.node_id,
            reason = ?retry.reason,
            turn = self.slot.session.turn,
            "Input rejected, asking again"
        );
        StepOutcome::Completed(self.finish(Some(retry)))
    }

    fn finish(self, retry: Option<RetryRequest>) -> TurnResult {
        let session = &self.slot.session;
        TurnResult {
            output_text: self.outputs.join("\n\n"),
            awaiting_input: !session.terminal,
            terminal: session.terminal,
            node_id: session.current_node.clone(),
            turn: session.turn,
            retry,
            warnings: self.warnings,
            visited: self.visited,
        }
    }
}
