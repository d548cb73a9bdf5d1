//! Node registry
//!
//! Three-level node hierarchy (ID, component, operation) plus relations,
//! owned by one [`Graph`].

pub mod domain;
pub mod infrastructure;

pub use domain::*;
pub use infrastructure::{Graph, UpdateSource};
