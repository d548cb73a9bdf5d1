pub mod cycles;
pub mod order;

pub use cycles::detect_cycles;
pub use order::{operation_digraph, strongly_connected, topological_order};
