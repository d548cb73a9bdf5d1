//! Evaluation schedule
//!
//! Built once per graph build, after relations:
//! 1. depth-first cycle detection marks loop-closing relations cyclic
//! 2. Tarjan SCC over the operation digraph collects the loops
//! 3. Kahn's algorithm over non-cyclic relations yields the order

pub mod domain;
pub mod infrastructure;

pub use domain::{CycleInfo, Schedule};

use tracing::debug;

use crate::features::node_registry::Graph;

impl Schedule {
    /// Order every operation of `graph`, marking cyclic relations on the way
    pub fn build(graph: &mut Graph) -> Schedule {
        let cycles = infrastructure::detect_cycles(graph);
        let digraph = infrastructure::operation_digraph(graph);
        let strongly_connected = infrastructure::strongly_connected(&digraph);
        let order = infrastructure::topological_order(graph, &digraph);

        let mut position = vec![usize::MAX; graph.operations().len()];
        for (index, op) in order.iter().enumerate() {
            position[op.index()] = index;
        }
        debug!(
            operations = order.len(),
            cycles = cycles.len(),
            scc = strongly_connected.len(),
            "schedule built"
        );
        Schedule {
            order,
            position,
            cycles,
            strongly_connected,
        }
    }
}
