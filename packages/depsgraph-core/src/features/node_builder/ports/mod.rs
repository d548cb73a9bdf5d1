//! Source of operation payloads

use crate::features::node_registry::{ComponentKey, EvalCallback, OperationKey};
use crate::shared::models::EntityId;

/// Supplies the work an operation runs when evaluated
///
/// Asked once per operation, when the node builder creates it. Operations
/// without a payload are still scheduled and flushed; evaluation skips them.
pub trait PayloadProvider: Send + Sync {
    fn payload(
        &self,
        entity: EntityId,
        component: &ComponentKey,
        operation: &OperationKey,
    ) -> Option<EvalCallback>;
}
