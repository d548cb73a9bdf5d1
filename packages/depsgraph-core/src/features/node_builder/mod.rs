//! Node builder
//!
//! Recursive descent from a root (scene render, view layer, or a list of
//! entities) that creates every ID, component and operation node the
//! relation builder will connect.

pub mod application;
pub mod domain;
pub mod ports;

pub use application::NodeBuilder;
pub use domain::{BuildContext, BuildStats, BuildStep};
pub use ports::PayloadProvider;
