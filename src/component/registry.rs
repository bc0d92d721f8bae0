//! Registry of sub-component tags

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use super::Component;

/// Errors that can occur while registering sub-components
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RegistryError {
    /// Tag registered twice on the same component
    #[error("duplicate sub-component registration: <{tag}>")]
    Duplicate { tag: String },

    /// A root component was registered as a sub-component
    #[error("component registered as <{tag}> was not built as a sub-component")]
    NotSubComponent { tag: String },

    /// Tag names follow element naming rules
    #[error("invalid sub-component tag: '{tag}'")]
    InvalidTag { tag: String },
}

/// Maps element tag names to the sub-components they instantiate
#[derive(Debug, Clone, Default)]
pub struct ComponentRegistry {
    components: HashMap<String, Arc<Component>>,
}

impl ComponentRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sub-component under a tag name
    ///
    /// Tags are matched case-insensitively, like element names.
    pub fn register(&mut self, tag: &str, component: Arc<Component>) -> Result<(), RegistryError> {
        let tag = tag.to_ascii_lowercase();
        let valid = tag.starts_with(|c: char| c.is_ascii_alphabetic())
            && tag
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(RegistryError::InvalidTag { tag });
        }
        if !component.is_sub() {
            return Err(RegistryError::NotSubComponent { tag });
        }
        if self.components.contains_key(&tag) {
            return Err(RegistryError::Duplicate { tag });
        }
        self.components.insert(tag, component);
        Ok(())
    }

    /// Get the sub-component for a tag
    pub fn get(&self, tag: &str) -> Option<&Arc<Component>> {
        self.components.get(tag)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.components.contains_key(tag)
    }

    /// All registered tags in sorted order
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<_> = self.components.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}
