//! Linked state and evaluation mode

use serde::{Deserialize, Serialize};

/// How an entity was reached during a build
///
/// Ordered: `Indirectly < ViaSet < Directly`. Updates combine with `max`,
/// so a node never goes back to a weaker state within one graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkedState {
    /// Only pulled in as a dependency of another entity
    Indirectly,
    /// Reached through a background set scene
    ViaSet,
    /// Build root, or a base of the active view layer
    Directly,
}

impl LinkedState {
    /// Combine with another observation, never downgrading
    #[inline]
    pub fn upgrade(self, other: LinkedState) -> LinkedState {
        self.max(other)
    }
}

impl Default for LinkedState {
    fn default() -> Self {
        Self::Indirectly
    }
}

/// Which visibility flags the build honours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationMode {
    Viewport,
    Render,
}

impl EvaluationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Viewport => "viewport",
            Self::Render => "render",
        }
    }
}

impl Default for EvaluationMode {
    fn default() -> Self {
        Self::Viewport
    }
}
