//! Dependency graph builder for scene evaluation
//!
//! Feature-first layout:
//! - shared/    : entity ids, node types, opcodes
//! - features/  : scene database, node registry, builder map, node and
//!   relation builders, schedule, tagging and evaluation, debug tooling
//! - pipeline/  : build pipelines and the [`Depsgraph`] they produce
//! - config/    : presets and YAML configuration
//!
//! A build runs in two phases. The [`NodeBuilder`] walks the scene from a
//! root and creates ID, component and operation nodes, each expansion
//! guarded by the [`BuilderMap`] so shared and cyclic references are built
//! once. It then turns into the [`RelationBuilder`], which only links
//! operations that already exist. The [`Schedule`] marks dependency cycles
//! and fixes the evaluation order.
//!
//! ```rust,no_run
//! use depsgraph_core::config::BuildConfig;
//! use depsgraph_core::features::scene_db::SceneArena;
//! use depsgraph_core::pipeline::ViewLayerPipeline;
//! # fn scene_arena() -> (SceneArena, depsgraph_core::EntityId) { unimplemented!() }
//!
//! let (db, scene) = scene_arena();
//! let config = BuildConfig::default();
//! let depsgraph = ViewLayerPipeline::new(&db, scene, "ViewLayer", &config)
//!     .build()
//!     .unwrap();
//! println!("{} operations", depsgraph.graph().operations().len());
//! ```

#![allow(clippy::new_without_default)] // Builders take their inputs explicitly
#![allow(clippy::module_inception)] // Module naming intentional

pub mod config;
pub mod errors;
pub mod features;
pub mod pipeline;
pub mod shared;

// ═══════════════════════════════════════════════════════════════════════════
// Re-exports for Public API
// ═══════════════════════════════════════════════════════════════════════════

pub use config::{BuildConfig, ConfigError, Preset};
pub use errors::{DepsgraphError, Result};
pub use features::builder_map::{BuildTags, BuilderMap};
pub use features::eval::{EvalStats, Evaluator};
pub use features::node_builder::{BuildStats, BuildStep, NodeBuilder, PayloadProvider};
pub use features::node_registry::{Graph, UpdateSource};
pub use features::relation_builder::RelationBuilder;
pub use features::scene_db::{SceneArena, SceneDatabase};
pub use features::schedule::Schedule;
pub use features::tagging::Recalc;
pub use pipeline::{
    build_all_view_layers, CompositorPipeline, Depsgraph, FromIdsPipeline, RenderPipeline,
    ViewLayerPipeline,
};
pub use shared::models::{EntityId, EvaluationMode, IdType, LinkedState, NodeType, OpCode};
