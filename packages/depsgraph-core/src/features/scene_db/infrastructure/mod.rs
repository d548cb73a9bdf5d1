//! Scene database implementations

pub mod arena;

pub use arena::SceneArena;
