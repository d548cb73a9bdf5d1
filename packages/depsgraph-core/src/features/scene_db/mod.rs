//! Scene database feature
//!
//! Entity model (domain), the read-only [`SceneDatabase`] port the builders
//! consume, and the in-memory [`SceneArena`] implementation.

pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use domain::*;
pub use infrastructure::SceneArena;
pub use ports::SceneDatabase;
