//! Graph size counters

use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::features::node_registry::Graph;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub id_nodes: usize,
    pub components: usize,
    pub operations: usize,
    pub relations: usize,
    pub cyclic_relations: usize,
}

impl GraphStats {
    pub fn collect(graph: &Graph) -> Self {
        Self {
            id_nodes: graph.id_nodes().len(),
            components: graph.id_nodes().iter().map(|n| n.components().len()).sum(),
            operations: graph.operations().len(),
            relations: graph.relations().len(),
            cyclic_relations: graph.relations().iter().filter(|r| r.is_cyclic()).count(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
