//! The reply-generator collaborator and the conversation memory it is fed with.
//!
//! The engine never talks to a model itself. It hands a [`ReplyRequest`] to whatever
//! [`ReplyGenerator`] the host installed and treats any error as a retryable turn failure.

use crate::error::CollaboratorError;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Labeled lines a generated reply may contain, and the bindings they feed.
const LABELED_FIELDS: &[(&str, &str)] = &[
    ("Issue Type:", "issue_type"),
    ("Visible Damage:", "visible_damage"),
    ("Symptoms Reported:", "symptoms_reported"),
    ("Step 1:", "step_one"),
    ("Step 2:", "step_two"),
    ("Step 3:", "step_three"),
    ("Tools Required:", "tools_required"),
    ("Image Findings:", "image_findings"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Everything a generator needs to produce one reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyRequest {
    pub session_id: String,
    pub node_id: String,
    /// System message first (when there is one), then history, then the latest user input.
    pub messages: Vec<ChatMessage>,
}

pub trait ReplyGenerator: Send + Sync {
    fn generate(&self, request: &ReplyRequest) -> Result<String, CollaboratorError>;
}

impl<F> ReplyGenerator for F
where
    F: Fn(&ReplyRequest) -> Result<String, CollaboratorError> + Send + Sync,
{
    fn generate(&self, request: &ReplyRequest) -> Result<String, CollaboratorError> {
        self(request)
    }
}

/// A bounded message log. The oldest messages fall off once `limit` is exceeded.
#[derive(Debug, Clone, Default)]
pub struct ConversationHistory {
    limit: usize,
    messages: VecDeque<ChatMessage>,
}

impl ConversationHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            messages: VecDeque::with_capacity(limit),
        }
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push_back(message);
        while self.messages.len() > self.limit {
            self.messages.pop_front();
        }
    }

    pub fn messages(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Pulls `Label: value` lines out of a generated reply as `(binding, value)` pairs.
///
/// Markdown emphasis around the label (`**Issue Type:** cracked`) is tolerated.
/// Later lines win when a label repeats.
pub fn extract_labeled_fields(text: &str) -> Vec<(String, String)> {
    let mut fields: Vec<(String, String)> = Vec::new();
    for line in text.lines() {
        for (label, key) in LABELED_FIELDS {
            let Some(pos) = line.find(label) else {
                continue;
            };
            let value = line[pos + label.len()..]
                .trim_start_matches(['*', '_'])
                .trim();
            if value.is_empty() {
                continue;
            }
            fields.retain(|(existing, _)| existing != key);
            fields.push((key.to_string(), value.to_string()));
            break;
        }
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_drops_oldest() {
        let mut history = ConversationHistory::new(2);
        history.push(ChatMessage::new(Role::User, "one"));
        history.push(ChatMessage::new(Role::Assistant, "two"));
        history.push(ChatMessage::new(Role::User, "three"));
        let contents: Vec<&str> = history.messages().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["two", "three"]);
    }

    #[test]
    fn test_extract_labeled_fields() {
        let reply = "Diagnosis\n\
                     **Issue Type:** loose joint\n\
                     Visible Damage: cracked leg\n\
                     Step 1: Remove the leg\n\
                     Tools Required:\n\
                     Step 2: Glue: wood glue only";
        let fields = extract_labeled_fields(reply);
        assert_eq!(
            fields,
            vec![
                ("issue_type".to_string(), "loose joint".to_string()),
                ("visible_damage".to_string(), "cracked leg".to_string()),
                ("step_one".to_string(), "Remove the leg".to_string()),
                ("step_two".to_string(), "Glue: wood glue only".to_string()),
            ]
        );
    }

    #[test]
    fn test_closures_are_generators() {
        let generator = |request: &ReplyRequest| -> Result<String, CollaboratorError> {
            Ok(format!("{} messages", request.messages.len()))
        };
        let request = ReplyRequest {
            session_id: "s".to_string(),
            node_id: "n".to_string(),
            messages: vec![ChatMessage::new(Role::User, "hi")],
        };
        assert_eq!(generator.generate(&request).unwrap(), "1 messages");
    }
}
