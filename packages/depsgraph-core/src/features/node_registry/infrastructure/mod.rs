pub mod graph;

pub use graph::{Graph, UpdateSource};
