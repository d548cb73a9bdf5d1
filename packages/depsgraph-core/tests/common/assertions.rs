//! Graph assertions

use depsgraph_core::features::debug::consistency_check;
use depsgraph_core::features::node_registry::{
    Graph, OperationId, OperationKey, RelationSource,
};
use depsgraph_core::{EntityId, NodeType, OpCode};

/// Operation `opcode` in the whole-ID component `node_type` of `entity`
pub fn find_op(graph: &Graph, entity: EntityId, node_type: NodeType, opcode: OpCode) -> Option<OperationId> {
    graph.find_operation_node(entity, node_type, "", &OperationKey::new(opcode))
}

pub fn op(graph: &Graph, entity: EntityId, node_type: NodeType, opcode: OpCode) -> OperationId {
    find_op(graph, entity, node_type, opcode).unwrap_or_else(|| {
        panic!(
            "expected operation {}/{} on entity {}, graph has:\n{}",
            node_type,
            opcode,
            entity,
            describe_operations(graph)
        )
    })
}

fn describe_operations(graph: &Graph) -> String {
    graph
        .operation_ids()
        .map(|op| format!("  {}", graph.operation_label(op)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Exactly one ID node refers to `entity`
pub fn assert_single_id_node(graph: &Graph, entity: EntityId) {
    let count = graph.id_nodes().iter().filter(|n| n.entity == entity).count();
    assert_eq!(count, 1, "expected one id node for entity {}, found {}", entity, count);
}

pub fn assert_no_id_node(graph: &Graph, entity: EntityId) {
    assert!(
        graph.find_id_node(entity).is_none(),
        "entity {} should not be in the graph",
        entity
    );
}

pub fn assert_has_operation(graph: &Graph, entity: EntityId, node_type: NodeType, opcode: OpCode) {
    op(graph, entity, node_type, opcode);
}

/// Some relation links the two operations in this direction
pub fn assert_relation(graph: &Graph, from: OperationId, to: OperationId) {
    let found = graph.operation(to).inlinks().iter().any(|rel| {
        graph.relation(*rel).from == RelationSource::Operation(from)
    });
    assert!(
        found,
        "expected relation {} -> {}",
        graph.operation_label(from),
        graph.operation_label(to)
    );
}

pub fn assert_no_relation(graph: &Graph, from: OperationId, to: OperationId) {
    let found = graph.operation(to).inlinks().iter().any(|rel| {
        graph.relation(*rel).from == RelationSource::Operation(from)
    });
    assert!(
        !found,
        "unexpected relation {} -> {}",
        graph.operation_label(from),
        graph.operation_label(to)
    );
}

pub fn assert_time_relation(graph: &Graph, to: OperationId) {
    let found = graph
        .operation(to)
        .inlinks()
        .iter()
        .any(|rel| graph.relation(*rel).from == RelationSource::TimeSource);
    assert!(found, "expected time source -> {}", graph.operation_label(to));
}

pub fn assert_consistent(graph: &Graph) {
    let problems = consistency_check(graph);
    assert!(problems.is_empty(), "graph inconsistent: {:#?}", problems);
}
