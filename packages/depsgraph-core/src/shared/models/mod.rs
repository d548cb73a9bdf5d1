//! Core identifiers and enumerations
//!
//! - [`EntityId`] / [`IdType`]: handles into the scene database
//! - [`NodeType`] / [`OpCode`]: component kinds and evaluation steps
//! - [`LinkedState`] / [`EvaluationMode`]: per-node and per-graph state

pub mod entity;
pub mod linked_state;
pub mod node_type;

pub use entity::{EntityId, IdType};
pub use linked_state::{EvaluationMode, LinkedState};
pub use node_type::{NodeType, OpCode};
