//! Error types for depsgraph-core
//!
//! Recoverable failures only. Contract violations inside the builders
//! (a root that is not a scene, a dangling handle where one is required)
//! panic instead.

use thiserror::Error;

use crate::config::ConfigError;
use crate::shared::models::EntityId;
use depsgraph_alloc::AllocError;

/// Main error type for depsgraph operations
#[derive(Debug, Error)]
pub enum DepsgraphError {
    /// The memory tag service refused an allocation; the graph is left
    /// partially built and must be rebuilt from scratch
    #[error("Allocation error: {0}")]
    Allocation(#[from] AllocError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Root entity is missing or not a scene
    #[error("Entity {0} is not a scene")]
    NotAScene(EntityId),

    /// Named view layer does not exist in the scene
    #[error("View layer '{name}' not found in scene {scene}")]
    ViewLayerNotFound { scene: EntityId, name: String },

    /// Root node tree is missing or not a node tree
    #[error("Entity {0} is not a node tree")]
    NotANodeTree(EntityId),

    /// Relations or schedule are stale; the graph must be rebuilt first
    #[error("Depsgraph needs a relations update before evaluation")]
    RelationsOutdated,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for depsgraph operations
pub type Result<T> = std::result::Result<T, DepsgraphError>;
