//! Propagate update tags from entry tags to everything downstream

use ahash::AHashSet;
use std::collections::VecDeque;
use tracing::debug;

use crate::features::node_registry::{
    ComponentId, Graph, OperationFlags, OperationId, RelationFlags,
};

/// Counters of one flush pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushStats {
    pub operations: usize,
    pub components: usize,
}

/// Mark every operation depending on an entry tag as `NEEDS_UPDATE`
///
/// Touching one operation of a component touches all of them. Cyclic and
/// `NO_FLUSH` relations stop the flush; `FLUSH_USER_EDIT_ONLY` relations
/// pass only when the source carries a user edit. ID nodes of operations
/// reached by a user edit are marked user-modified.
pub fn flush_updates(graph: &mut Graph) -> FlushStats {
    let mut scheduled = vec![false; graph.operations().len()];
    let mut touched: AHashSet<ComponentId> = AHashSet::new();
    let mut queue: VecDeque<OperationId> = VecDeque::new();

    for op in graph.entry_tags().to_vec() {
        if !scheduled[op.index()] {
            scheduled[op.index()] = true;
            queue.push_back(op);
        }
    }

    let mut flushed = 0;
    while let Some(op) = queue.pop_front() {
        flushed += 1;
        graph.operation_mut(op).flags.insert(OperationFlags::NEEDS_UPDATE);
        let flags = graph.operation(op).flags;
        let owner = graph.operation(op).owner();

        if flags.contains(OperationFlags::USER_MODIFIED) {
            graph.id_node_mut(owner.id_node).is_user_modified = true;
        }

        if touched.insert(owner) {
            for sibling in graph.component(owner).operations().to_vec() {
                graph
                    .operation_mut(sibling)
                    .flags
                    .insert(OperationFlags::NEEDS_UPDATE);
                if !scheduled[sibling.index()] {
                    scheduled[sibling.index()] = true;
                    queue.push_back(sibling);
                }
            }
        }

        let carried = flags.intersection(OperationFlags::FLUSH);
        for rel in graph.operation(op).outlinks().to_vec() {
            let relation = graph.relation(rel);
            if relation.flags.contains(RelationFlags::CYCLIC)
                || relation.flags.contains(RelationFlags::NO_FLUSH)
            {
                continue;
            }
            if relation.flags.contains(RelationFlags::FLUSH_USER_EDIT_ONLY)
                && !flags.contains(OperationFlags::USER_MODIFIED)
            {
                continue;
            }
            let target = relation.to;
            graph
                .operation_mut(target)
                .flags
                .insert(OperationFlags::NEEDS_UPDATE | carried);
            if !scheduled[target.index()] {
                scheduled[target.index()] = true;
                queue.push_back(target);
            }
        }
    }

    debug!(operations = flushed, components = touched.len(), "updates flushed");
    FlushStats {
        operations: flushed,
        components: touched.len(),
    }
}

/// Drop every update bit and the entry tags; pinned stays
pub fn clear_update_flags(graph: &mut Graph) {
    let ids: Vec<OperationId> = graph.operation_ids().collect();
    for op in ids {
        graph.operation_mut(op).flags.remove(
            OperationFlags::NEEDS_UPDATE
                | OperationFlags::DIRECTLY_MODIFIED
                | OperationFlags::USER_MODIFIED,
        );
    }
    graph.clear_entry_tags();
}
