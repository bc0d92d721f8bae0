//! Configuration for directive execution and reactivity

use serde::Deserialize;

/// Configuration options shared by every instance of a component
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Attribute prefix that marks directives (e.g., "v-" for "v-if")
    pub prefix: String,

    /// How deeply watchers may nest `set` calls before failing
    pub max_watch_depth: usize,

    /// Whether whitespace-only text nodes bypass the text templater
    pub skip_whitespace_text: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            prefix: "v-".to_string(),
            max_watch_depth: 32,
            skip_whitespace_text: true,
        }
    }
}

impl EngineConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the directive prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Set the watcher nesting limit
    pub fn with_max_watch_depth(mut self, depth: usize) -> Self {
        self.max_watch_depth = depth;
        self
    }

    /// Set whether whitespace-only text skips interpolation
    pub fn with_skip_whitespace_text(mut self, skip: bool) -> Self {
        self.skip_whitespace_text = skip;
        self
    }
}
