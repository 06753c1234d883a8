//! Engine and compiler settings, loadable from a TOML file.
//!
//! ```toml
//! [engine]
//! history_limit = 10
//! off_topic_keywords = ["weather", "politics"]
//!
//! [engine.initial_bindings]
//! video_link = "https://example.com/guide"
//!
//! [compiler]
//! infer_kinds = false
//!
//! [compiler.type_mappings]
//! visual_support = "message"
//! check_another_repair = "decision"
//! ```

use crate::error::ConfigError;
use ahash::AHashMap;
use itertools::Itertools;
use serde::Deserialize;
use std::fs;
use std::path::Path;

const DEFAULT_OFF_TOPIC_KEYWORDS: &[&str] = &[
    "weather",
    "politics",
    "news",
    "movies",
    "games",
    "sports",
    "celebrities",
    "music",
    "ai",
    "programming",
    "science",
    "history",
    "relationships",
    "jokes",
];

/// Top-level config file layout.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub compiler: CompilerOptions,
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}

/// Runtime settings of the [`Engine`](crate::engine::Engine).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Max messages kept per session for the reply generator.
    pub history_limit: usize,
    /// Every turn binds the trimmed user input under this name.
    pub input_binding: String,
    /// Generated replies are bound under this name.
    pub reply_binding: String,
    /// Bound on entry to the start node unless already bound.
    pub initial_bindings: AHashMap<String, String>,
    /// Case-insensitive words or phrases that mark free-form input as off topic.
    pub off_topic_keywords: Vec<String>,
    pub off_topic_reply: String,
    /// Overrides the flow document's opening statement.
    pub opening_statement: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_limit: 10,
            input_binding: "last_input".to_string(),
            reply_binding: "reply".to_string(),
            initial_bindings: AHashMap::new(),
            off_topic_keywords: DEFAULT_OFF_TOPIC_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
            off_topic_reply: "I'd love to help you with a repair! Let's focus on fixing something."
                .to_string(),
            opening_statement: None,
        }
    }
}

impl EngineConfig {
    /// Whether `input` contains one of the off-topic keywords as a whole word or phrase.
    ///
    /// Both sides are compared as lowercase words, so `"stock market"` matches
    /// "How's the Stock  Market?" but not "stockmarket".
    pub fn is_off_topic(&self, input: &str) -> bool {
        let text = normalize_words(input);
        if text.is_empty() {
            return false;
        }
        let padded = format!(" {} ", text);
        self.off_topic_keywords
            .iter()
            .map(|keyword| normalize_words(keyword))
            .filter(|keyword| !keyword.is_empty())
            .any(|keyword| padded.contains(&format!(" {} ", keyword)))
    }
}

fn normalize_words(text: &str) -> String {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .join(" ")
}

/// Settings for turning type names into node kinds at load time.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CompilerOptions {
    /// Document type name -> `start|message|decision|end`.
    pub type_mappings: AHashMap<String, String>,
    /// Give unmapped type names a kind from their input spec instead of rejecting them.
    pub infer_kinds: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            type_mappings: AHashMap::new(),
            infer_kinds: true,
        }
    }
}
