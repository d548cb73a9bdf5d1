//! Debug tooling: size counters, consistency checks, DOT export

pub mod consistency;
pub mod graphviz;
pub mod stats;

pub use consistency::consistency_check;
pub use graphviz::to_graphviz;
pub use stats::GraphStats;
