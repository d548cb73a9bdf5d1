//! Structural checks over a built graph

use ahash::AHashSet;
use tracing::error;

use crate::features::node_registry::{Graph, OperationId, RelationSource};

/// Every broken invariant found, one message each; empty when consistent
///
/// Checks that relation endpoints exist and list the relation on both sides,
/// that each operation is registered in exactly one component, and that
/// component entry/exit operations belong to that component.
pub fn consistency_check(graph: &Graph) -> Vec<String> {
    let mut problems = Vec::new();
    let op_count = graph.operations().len();

    for (index, relation) in graph.relations().iter().enumerate() {
        let to = relation.to;
        if to.index() >= op_count {
            problems.push(format!("relation {} '{}' targets missing {}", index, relation.name, to));
            continue;
        }
        if !graph.operation(to).inlinks().iter().any(|rel| rel.index() == index) {
            problems.push(format!("relation {} '{}' missing from target inlinks", index, relation.name));
        }
        match relation.from {
            RelationSource::Operation(from) if from.index() >= op_count => {
                problems.push(format!("relation {} '{}' from missing {}", index, relation.name, from));
            }
            RelationSource::Operation(from) => {
                if !graph.operation(from).outlinks().iter().any(|rel| rel.index() == index) {
                    problems.push(format!("relation {} '{}' missing from source outlinks", index, relation.name));
                }
            }
            RelationSource::TimeSource => match graph.time_source() {
                Some(time) if time.outlinks().iter().any(|rel| rel.index() == index) => {}
                Some(_) => problems.push(format!("relation {} '{}' missing from time source outlinks", index, relation.name)),
                None => problems.push(format!("relation {} '{}' from missing time source", index, relation.name)),
            },
        }
    }

    let mut registered: AHashSet<OperationId> = AHashSet::new();
    for id_node in graph.id_nodes() {
        for component in id_node.components() {
            for op in component.operations() {
                if !registered.insert(*op) {
                    problems.push(format!("{} registered more than once", graph.operation_label(*op)));
                } else if graph.operation(*op).owner() != component.id() {
                    problems.push(format!("{} listed under a foreign component", graph.operation_label(*op)));
                }
            }
            let ends = [component.entry_operation(), component.exit_operation()];
            for op in ends.into_iter().flatten() {
                if !component.operations().contains(&op) {
                    problems.push(format!(
                        "{}/{}: entry or exit {} is not one of its operations",
                        id_node.name,
                        component.node_type(),
                        op
                    ));
                }
            }
        }
    }
    if registered.len() != op_count {
        problems.push(format!(
            "{} operations not registered in any component",
            op_count - registered.len().min(op_count)
        ));
    }

    for problem in &problems {
        error!("depsgraph consistency: {}", problem);
    }
    problems
}
