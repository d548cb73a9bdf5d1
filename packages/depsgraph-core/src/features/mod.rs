//! Feature modules
//!
//! Each feature contains some of:
//! - domain/         - Node kinds, keys and plain data
//! - ports/          - Interface definitions (traits)
//! - application/    - Builders driving the graph
//! - infrastructure/ - Concrete storage and algorithms

// Scene entities and the database the builders read
pub mod scene_db;

// Graph container: ID, component and operation nodes, relations
pub mod node_registry;

// Per-build dedup tags
pub mod builder_map;

// Scene traversal creating nodes
pub mod node_builder;

// Second phase: relations between existing operations
pub mod relation_builder;

// Cycle marking and evaluation order
pub mod schedule;

// Update tags, flush and evaluation
pub mod tagging;
pub mod eval;

// Stats, consistency check, DOT export
pub mod debug;
