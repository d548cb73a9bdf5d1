//! Relation builder
//!
//! Second phase of a build: connects the operations created by the node
//! builder. Constructed only by consuming the node builder.

pub mod application;

pub use application::RelationBuilder;
