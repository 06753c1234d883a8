//! Prompt templates with `{name}` placeholders.
//!
//! Templates are parsed once when the graph is compiled and rendered on every visit.
//! Rendering is pure: the same template and bindings always give the same text.

use ahash::AHashMap;
use serde::Serialize;
use std::fmt;

/// A placeholder that had no binding at render time. It renders as an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct UnresolvedPlaceholder {
    pub name: String,
}

impl fmt::Display for UnresolvedPlaceholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.name)
    }
}

/// The output of a render: the text plus any placeholders that were left empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub text: String,
    pub warnings: Vec<UnresolvedPlaceholder>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A prompt string split into literal text and placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(source: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = source;

        while let Some(open) = rest.find('{') {
            literal.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            match after.find('}') {
                Some(close) if is_placeholder_name(&after[..close]) => {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder(after[..close].to_string()));
                    rest = &after[close + 1..];
                }
                // Not a placeholder: keep the brace and rescan from the next character.
                _ => {
                    literal.push('{');
                    rest = after;
                }
            }
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Self {
            source: source.to_string(),
            segments,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Placeholder names in order of first appearance.
    pub fn placeholders(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for segment in &self.segments {
            if let Segment::Placeholder(name) = segment {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
        }
        names
    }

    pub fn render(&self, bindings: &AHashMap<String, String>) -> Rendered {
        let mut text = String::with_capacity(self.source.len());
        let mut warnings: Vec<UnresolvedPlaceholder> = Vec::new();

        for segment in &self.segments {
            match segment {
                Segment::Literal(literal) => text.push_str(literal),
                Segment::Placeholder(name) => match bindings.get(name) {
                    Some(value) => text.push_str(value),
                    None => {
                        if !warnings.iter().any(|w| &w.name == name) {
                            warnings.push(UnresolvedPlaceholder { name: name.clone() });
                        }
                    }
                },
            }
        }

        Rendered { text, warnings }
    }
}

/// Renders `template` against `bindings` in one step.
pub fn render(template: &str, bindings: &AHashMap<String, String>) -> Rendered {
    Template::parse(template).render(bindings)
}

fn is_placeholder_name(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}
