use crate::error::RecordError;
use ahash::AHashMap;
use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Variable bindings accumulated over a conversation.
pub type Bindings = AHashMap<String, String>;

/// The flat persisted form of a session.
pub type SessionRecord = Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Terminated,
    Failed,
}

/// The per-conversation state, kept flat so any key-value store can persist it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub current_node: String,
    pub bindings: Bindings,
    /// Incremented once per accepted `submit_turn`, including retries.
    pub turn: u64,
    pub terminal: bool,
    /// Whether the current node has been prompted and is waiting for a reply.
    pub awaiting_input: bool,
    pub failed: bool,
}

impl Session {
    pub fn new(start_node: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), start_node)
    }

    pub fn with_id(id: impl Into<String>, start_node: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            current_node: start_node.into(),
            bindings: Bindings::new(),
            turn: 0,
            terminal: false,
            awaiting_input: false,
            failed: false,
        }
    }

    pub fn status(&self) -> SessionStatus {
        if self.failed {
            SessionStatus::Failed
        } else if self.terminal {
            SessionStatus::Terminated
        } else {
            SessionStatus::Active
        }
    }

    /// Binds `name`, replacing any earlier value.
    pub fn bind(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.bindings.insert(name.into(), value.into());
    }

    pub fn binding(&self, name: &str) -> Option<&str> {
        self.bindings.get(name).map(String::as_str)
    }

    /// Encodes the session using the bincode format.
    pub fn to_bytes(&self) -> Result<Vec<u8>, RecordError> {
        encode_to_vec(self, standard()).map_err(|e| RecordError::Encode(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RecordError> {
        decode_from_slice(bytes, standard())
            .map(|(session, _)| session) // bincode 2 returns a tuple (data, bytes_read)
            .map_err(|e| RecordError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_starts_active() {
        let session = Session::new("start");
        assert_eq!(session.current_node, "start");
        assert_eq!(session.turn, 0);
        assert_eq!(session.status(), SessionStatus::Active);
        assert!(!session.id.is_empty());
    }

    #[test]
    fn test_bincode_persistence() {
        let mut session = Session::with_id("s-1", "check_another_repair");
        session.bind("material_1", "Wood glue");
        session.turn = 7;
        session.awaiting_input = true;

        let bytes = session.to_bytes().unwrap();
        let restored = Session::from_bytes(&bytes).unwrap();
        assert_eq!(restored, session);
        assert_eq!(restored.binding("material_1"), Some("Wood glue"));
    }

    #[test]
    fn test_garbage_bytes_fail_to_decode() {
        assert!(Session::from_bytes(&[0xff, 0x01]).is_err());
    }

    #[test]
    fn test_status_precedence() {
        let mut session = Session::new("start");
        session.terminal = true;
        assert_eq!(session.status(), SessionStatus::Terminated);
        session.failed = true;
        assert_eq!(session.status(), SessionStatus::Failed);
    }
}
