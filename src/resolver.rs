//! Classifies raw user replies against a node's input specification.
//!
//! Resolution is pure. The engine applies the resulting bindings and transition.

use crate::graph::{InputSpec, Node};
use itertools::Itertools;
use serde::Serialize;

const YES_SYNONYMS: &[&str] = &[
    "yes",
    "y",
    "yeah",
    "yea",
    "yep",
    "yup",
    "sure",
    "ok",
    "okay",
    "of course",
    "absolutely",
    "definitely",
    "certainly",
    "correct",
    "affirmative",
    "please",
    "yes please",
    "sure thing",
    "i do",
];

const NO_SYNONYMS: &[&str] = &[
    "no",
    "n",
    "nope",
    "nah",
    "no thanks",
    "no thank you",
    "not really",
    "not now",
    "negative",
    "never",
    "i don't",
    "i do not",
    "that's all",
    "nothing else",
];

/// Why a reply could not be accepted and the node must be asked again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryReason {
    InvalidChoice,
    AmbiguousYesNo,
    OffTopic,
    CollaboratorUnavailable,
}

/// A recoverable rejection of the turn's input. The session stays on `node_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetryRequest {
    pub node_id: String,
    pub reason: RetryReason,
    pub valid_options: Vec<String>,
    /// Short user-facing hint appended to the re-emitted prompt.
    pub guidance: String,
}

impl RetryRequest {
    pub fn new(
        node_id: impl Into<String>,
        reason: RetryReason,
        guidance: impl Into<String>,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            reason,
            valid_options: Vec::new(),
            guidance: guidance.into(),
        }
    }
}

/// An accepted reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInput {
    /// The edge condition this reply selects. `None` selects the default edge.
    pub label: Option<String>,
    pub binding: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(ResolvedInput),
    Retry(RetryRequest),
}

pub struct InputResolver;

impl InputResolver {
    pub fn resolve(node: &Node, raw_input: &str) -> Resolution {
        match &node.input {
            None | Some(InputSpec::FreeText) => Resolution::Resolved(ResolvedInput {
                label: None,
                binding: node.binding.clone(),
                value: raw_input.trim().to_string(),
            }),
            Some(InputSpec::MultipleChoice(choices)) => {
                let wanted = normalize(raw_input);
                match choices.iter().find(|choice| normalize(choice) == wanted) {
                    Some(choice) => Resolution::Resolved(ResolvedInput {
                        label: Some(choice.clone()),
                        binding: node.binding.clone(),
                        value: choice.clone(),
                    }),
                    None => Resolution::Retry(RetryRequest {
                        node_id: node.id.clone(),
                        reason: RetryReason::InvalidChoice,
                        valid_options: choices.clone(),
                        guidance: format!("Please choose one of: {}.", choices.iter().join(", ")),
                    }),
                }
            }
            Some(InputSpec::YesNo) => match normalize_yes_no(raw_input) {
                Some(label) => Resolution::Resolved(ResolvedInput {
                    label: Some(label.to_string()),
                    binding: node.binding.clone(),
                    value: label.to_string(),
                }),
                None => Resolution::Retry(RetryRequest {
                    node_id: node.id.clone(),
                    reason: RetryReason::AmbiguousYesNo,
                    valid_options: vec!["yes".to_string(), "no".to_string()],
                    guidance: "Please answer yes or no.".to_string(),
                }),
            },
        }
    }
}

/// Trims, lowercases and collapses inner whitespace.
pub fn normalize(text: &str) -> String {
    text.split_whitespace().join(" ").to_lowercase()
}

/// Maps a reply onto `"yes"` or `"no"` through the synonym table.
pub fn normalize_yes_no(raw_input: &str) -> Option<&'static str> {
    let normalized = normalize(raw_input);
    let cleaned = normalized
        .trim_end_matches(['.', '!', '?', ','])
        .replace(',', "")
        .replace('\u{2019}', "'");

    if YES_SYNONYMS.contains(&cleaned.as_str()) {
        Some("yes")
    } else if NO_SYNONYMS.contains(&cleaned.as_str()) {
        Some("no")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeKind;

    fn node(input: Option<InputSpec>) -> Node {
        Node {
            id: "ask".to_string(),
            kind: NodeKind::Decision,
            type_name: "decision".to_string(),
            prompt: None,
            input,
            binding: Node::default_binding("ask"),
            generate: false,
        }
    }

    #[test]
    fn test_yes_no_synonyms() {
        assert_eq!(normalize_yes_no("Yeah"), Some("yes"));
        assert_eq!(normalize_yes_no("  yep! "), Some("yes"));
        assert_eq!(normalize_yes_no("No thanks."), Some("no"));
        assert_eq!(normalize_yes_no("nope"), Some("no"));
        assert_eq!(normalize_yes_no("No, thanks"), Some("no"));
        assert_eq!(normalize_yes_no("I don\u{2019}t"), Some("no"));
        assert_eq!(normalize_yes_no("maybe"), None);
        assert_eq!(normalize_yes_no(""), None);
    }

    #[test]
    fn test_multiple_choice_is_case_and_space_insensitive() {
        let n = node(Some(InputSpec::MultipleChoice(vec![
            "Local materials".to_string(),
            "Alternatives".to_string(),
        ])));
        match InputResolver::resolve(&n, "  local   MATERIALS ") {
            Resolution::Resolved(r) => {
                assert_eq!(r.label.as_deref(), Some("Local materials"));
                assert_eq!(r.value, "Local materials");
                assert_eq!(r.binding, "ask_response");
            }
            other => panic!("expected resolution, got {:?}", other),
        }
    }

    #[test]
    fn test_multiple_choice_rejects_partial_match() {
        let n = node(Some(InputSpec::MultipleChoice(vec!["Alternatives".to_string()])));
        match InputResolver::resolve(&n, "Alternative") {
            Resolution::Retry(retry) => {
                assert_eq!(retry.reason, RetryReason::InvalidChoice);
                assert_eq!(retry.valid_options, vec!["Alternatives".to_string()]);
                assert_eq!(retry.guidance, "Please choose one of: Alternatives.");
            }
            other => panic!("expected retry, got {:?}", other),
        }
    }

    #[test]
    fn test_free_text_always_resolves() {
        let n = node(Some(InputSpec::FreeText));
        assert_eq!(
            InputResolver::resolve(&n, " my chair wobbles "),
            Resolution::Resolved(ResolvedInput {
                label: None,
                binding: "ask_response".to_string(),
                value: "my chair wobbles".to_string(),
            })
        );
    }

    #[test]
    fn test_unrecognised_yes_no_is_retry() {
        let n = node(Some(InputSpec::YesNo));
        match InputResolver::resolve(&n, "perhaps") {
            Resolution::Retry(retry) => assert_eq!(retry.reason, RetryReason::AmbiguousYesNo),
            other => panic!("expected retry, got {:?}", other),
        }
    }
}
