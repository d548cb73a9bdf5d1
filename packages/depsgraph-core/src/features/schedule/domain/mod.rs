//! Evaluation order and cycle reports

use serde::Serialize;

use crate::features::node_registry::{OperationId, RelationId};

/// One relation that closed a dependency loop
///
/// `path` runs from the relation's target around the loop back to its source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleInfo {
    pub relation: RelationId,
    pub path: Vec<OperationId>,
}

/// Operation order for one evaluation pass
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    pub(crate) order: Vec<OperationId>,
    pub(crate) position: Vec<usize>,
    pub(crate) cycles: Vec<CycleInfo>,
    pub(crate) strongly_connected: Vec<Vec<OperationId>>,
}

impl Schedule {
    /// Operations, every one after all of its non-cyclic inputs
    pub fn order(&self) -> &[OperationId] {
        &self.order
    }

    pub fn cycles(&self) -> &[CycleInfo] {
        &self.cycles
    }

    pub fn has_cycles(&self) -> bool {
        !self.cycles.is_empty()
    }

    /// Strongly connected groups with more than one operation
    pub fn strongly_connected(&self) -> &[Vec<OperationId>] {
        &self.strongly_connected
    }

    pub fn position(&self, op: OperationId) -> Option<usize> {
        self.position.get(op.index()).copied().filter(|p| *p != usize::MAX)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
