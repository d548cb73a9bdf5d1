//! Entry tags: mark operations as changed before a flush

use tracing::{debug, trace};

use crate::features::node_registry::{
    Graph, OperationId, PersistentOperationKey, RelationSource, UpdateSource,
};
use crate::features::tagging::Recalc;
use crate::shared::models::{EntityId, NodeType};

/// Tag the components of `entity` addressed by `recalc`
///
/// A component with an explicit entry is tagged at its entry; one without is
/// tagged at every operation. Entities with an evaluated copy also get their
/// copy-on-write operation tagged. Returns the number of operations tagged.
pub fn tag_id(graph: &mut Graph, entity: EntityId, recalc: Recalc, source: UpdateSource) -> usize {
    let id_node = match graph.find_id_node(entity) {
        Some(id_node) => id_node,
        None => {
            debug!(entity = ?entity, "tag for entity outside the graph ignored");
            return 0;
        }
    };

    let mut targets: Vec<OperationId> = Vec::new();
    let mut node_types = recalc.components();
    if !node_types.is_empty() {
        node_types.push(NodeType::CopyOnWrite);
    }
    for component in graph.id_node(id_node).components() {
        if !node_types.contains(&component.node_type()) {
            continue;
        }
        if component.has_explicit_entry() {
            targets.extend(component.entry_operation());
        } else {
            targets.extend_from_slice(component.operations());
        }
    }

    for op in &targets {
        graph.tag_operation_update(*op, source);
    }
    trace!(entity = ?entity, recalc = ?recalc, tagged = targets.len(), "entity tagged");
    targets.len()
}

/// Tag one operation by its persistent key; false when it is not in the graph
pub fn tag_operation(graph: &mut Graph, key: &PersistentOperationKey, source: UpdateSource) -> bool {
    match graph.find_persistent(key) {
        Some(op) => {
            graph.tag_operation_update(op, source);
            true
        }
        None => {
            debug!(entity = ?key.entity, operation = %key.operation, "tag for missing operation ignored");
            false
        }
    }
}

/// Frame change: tag every operation fed directly by the time source
pub fn tag_time_source(graph: &mut Graph) -> usize {
    let outlinks = match graph.time_source_mut() {
        Some(time) => {
            time.tagged_for_update = true;
            time.outlinks().to_vec()
        }
        None => return 0,
    };
    let targets: Vec<OperationId> = outlinks
        .into_iter()
        .filter(|rel| graph.relation(*rel).from == RelationSource::TimeSource)
        .map(|rel| graph.relation(rel).to)
        .collect();

    for op in &targets {
        graph.tag_operation_update(*op, UpdateSource::Time);
    }
    targets.len()
}
