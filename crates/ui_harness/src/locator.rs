//! Element locators for UI queries

use std::fmt;

/// Strategy used to match a node in a UI snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// Exact visible-text match
    Text(String),
    /// Exact `resource-id` match
    ResourceId(String),
}

/// Immutable descriptor identifying a UI node.
///
/// A locator is only a lookup key. It is resolved against a fresh UI
/// snapshot each time an assertion polls, never at construction time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    strategy: Strategy,
}

impl Locator {
    /// Locate a node by its exact visible text
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            strategy: Strategy::Text(text.into()),
        }
    }

    /// Locate a node by its exact resource id
    pub fn resource_id(id: impl Into<String>) -> Self {
        Self {
            strategy: Strategy::ResourceId(id.into()),
        }
    }

    /// Get the matching strategy
    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.strategy {
            Strategy::Text(text) => write!(f, "text={:?}", text),
            Strategy::ResourceId(id) => write!(f, "resource-id={:?}", id),
        }
    }
}
