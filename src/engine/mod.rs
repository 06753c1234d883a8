//! Drives sessions through a shared [`Graph`], one turn at a time.
//!
//! The engine owns every live session. A turn locks only its own session, so any number of
//! sessions can run concurrently against the same graph while turns of one session stay
//! strictly sequential.

mod step;
mod store;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::graph::Graph;
use crate::reply::ReplyGenerator;
use crate::resolver::{RetryReason, RetryRequest};
use crate::session::{Session, SessionRecord};
use crate::template::UnresolvedPlaceholder;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use step::{StepOutcome, TurnRunner};
use store::{SessionSlot, SessionTable, lock};
use tracing::{error, info, warn};

const UNAVAILABLE_GUIDANCE: &str =
    "Sorry, I couldn't come up with a reply just now. Please try again.";

/// What one `submit_turn` produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnResult {
    /// Every prompt emitted during the turn, separated by a blank line.
    pub output_text: String,
    pub awaiting_input: bool,
    pub terminal: bool,
    /// Where the session now rests.
    pub node_id: String,
    pub turn: u64,
    /// Set when the input was rejected and the same node is being asked again.
    pub retry: Option<RetryRequest>,
    pub warnings: Vec<UnresolvedPlaceholder>,
    /// Nodes entered during the turn, in order.
    pub visited: Vec<String>,
}

pub struct Engine {
    graph: Arc<Graph>,
    config: EngineConfig,
    generator: Option<Arc<dyn ReplyGenerator>>,
    sessions: SessionTable,
}

pub struct EngineBuilder {
    graph: Arc<Graph>,
    config: EngineConfig,
    generator: Option<Arc<dyn ReplyGenerator>>,
}

impl EngineBuilder {
    pub fn new(graph: impl Into<Arc<Graph>>) -> Self {
        Self {
            graph: graph.into(),
            config: EngineConfig::default(),
            generator: None,
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Installs the collaborator that writes replies for `generate` nodes.
    pub fn with_generator<G>(mut self, generator: G) -> Self
    where
        G: ReplyGenerator + 'static,
    {
        self.generator = Some(Arc::new(generator));
        self
    }

    pub fn build(self) -> Engine {
        Engine {
            graph: self.graph,
            config: self.config,
            generator: self.generator,
            sessions: SessionTable::default(),
        }
    }
}

impl Engine {
    /// An engine with the default [`EngineConfig`] and no reply generator.
    pub fn new(graph: impl Into<Arc<Graph>>) -> Self {
        EngineBuilder::new(graph).build()
    }

    pub fn builder(graph: impl Into<Arc<Graph>>) -> EngineBuilder {
        EngineBuilder::new(graph)
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Creates a session resting on the start node and returns its id.
    pub fn start_session(&self) -> String {
        let session = Session::new(self.graph.start_id());
        let id = self
            .sessions
            .insert(SessionSlot::new(session, self.config.history_limit));
        info!(session_id = %id, start = %self.graph.start_id(), "Session started");
        id
    }

    /// Runs one turn: resolves `input` against the node the session waits on, then advances
    /// until a node needs input or the conversation ends.
    ///
    /// Rejected input and generator failures come back as `Ok` with `retry` set. An internal
    /// inconsistency fails the session and returns [`EngineError::SessionFailed`].
    pub fn submit_turn(&self, session_id: &str, input: &str) -> Result<TurnResult, EngineError> {
        let slot = self.slot(session_id)?;
        let mut slot = lock(&slot);

        if slot.session.failed {
            return Err(EngineError::SessionFailed(session_id.to_string()));
        }
        if slot.session.terminal {
            warn!(session_id, "Input received after the conversation ended");
            return Err(EngineError::SessionTerminated(session_id.to_string()));
        }

        let before = slot.clone();
        let outcome = TurnRunner::new(
            &self.graph,
            &self.config,
            self.generator.as_deref(),
            &mut slot,
        )
        .run(input);

        match outcome {
            Ok(StepOutcome::Completed(result)) => Ok(result),
            Ok(StepOutcome::CollaboratorFailed { node_id, error }) => {
                warn!(
                    session_id,
                    node_id = %node_id,
                    error = %error,
                    "Reply generator failed, turn rolled back"
                );
                *slot = before;
                let session = &slot.session;
                Ok(TurnResult {
                    output_text: UNAVAILABLE_GUIDANCE.to_string(),
                    awaiting_input: true,
                    terminal: false,
                    node_id: session.current_node.clone(),
                    turn: session.turn,
                    retry: Some(RetryRequest::new(
                        node_id,
                        RetryReason::CollaboratorUnavailable,
                        UNAVAILABLE_GUIDANCE,
                    )),
                    warnings: Vec::new(),
                    visited: Vec::new(),
                })
            }
            Err(err) => {
                error!(
                    session_id,
                    node_id = %slot.session.current_node,
                    turn = slot.session.turn,
                    error = %err,
                    "Session failed"
                );
                slot.last_good = Some(before.session);
                slot.session.failed = true;
                Err(EngineError::SessionFailed(session_id.to_string()))
            }
        }
    }

    /// Sets a binding from outside a turn, e.g. findings from an image analysis.
    pub fn bind(
        &self,
        session_id: &str,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), EngineError> {
        let slot = self.slot(session_id)?;
        let mut slot = lock(&slot);
        if slot.session.failed {
            return Err(EngineError::SessionFailed(session_id.to_string()));
        }
        slot.session.bind(name, value);
        Ok(())
    }

    /// A copy of the session's current record.
    pub fn snapshot(&self, session_id: &str) -> Result<SessionRecord, EngineError> {
        let slot = self.slot(session_id)?;
        let slot = lock(&slot);
        Ok(slot.session.clone())
    }

    /// The record as it was before the turn that failed the session. `None` while it is healthy.
    pub fn failure_snapshot(&self, session_id: &str) -> Result<Option<SessionRecord>, EngineError> {
        let slot = self.slot(session_id)?;
        let slot = lock(&slot);
        Ok(slot.last_good.clone())
    }

    /// Re-admits a persisted session, replacing any live session with the same id.
    ///
    /// The conversation history is not part of the record and starts empty.
    pub fn restore(&self, record: SessionRecord) -> Result<String, EngineError> {
        let invalid = |message: String| EngineError::InvalidRecord {
            session_id: record.id.clone(),
            message,
        };
        let node = self
            .graph
            .node(&record.current_node)
            .map_err(|err| invalid(err.to_string()))?;
        if record.awaiting_input && !node.suspends() {
            return Err(invalid(format!(
                "node '{}' never waits for input",
                record.current_node
            )));
        }

        let id = self
            .sessions
            .insert(SessionSlot::new(record, self.config.history_limit));
        info!(session_id = %id, "Session restored");
        Ok(id)
    }

    /// Forgets a session. Returns whether it existed.
    pub fn close_session(&self, session_id: &str) -> bool {
        let removed = self.sessions.remove(session_id);
        if removed {
            info!(session_id, "Session closed");
        }
        removed
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    fn slot(&self, session_id: &str) -> Result<Arc<Mutex<SessionSlot>>, EngineError> {
        self.sessions
            .get(session_id)
            .ok_or_else(|| EngineError::UnknownSession(session_id.to_string()))
    }
}
