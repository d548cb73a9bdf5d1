//! Scene database domain model

pub mod entity;
pub mod scene;

pub use entity::*;
pub use scene::*;
