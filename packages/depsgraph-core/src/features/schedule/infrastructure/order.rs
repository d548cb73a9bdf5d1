//! Evaluation order over the operation graph

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::VecDeque;
use tracing::warn;

use crate::features::node_registry::{Graph, OperationId, RelationId, RelationSource};

/// Operation graph as a petgraph `DiGraph`
///
/// Node indices equal operation indices. Relations from the time source are
/// left out: the time source is not an operation.
pub fn operation_digraph(graph: &Graph) -> DiGraph<OperationId, RelationId> {
    let mut digraph = DiGraph::with_capacity(graph.operations().len(), graph.relations().len());
    for op in graph.operation_ids() {
        digraph.add_node(op);
    }
    for (index, relation) in graph.relations().iter().enumerate() {
        if let RelationSource::Operation(from) = relation.from {
            digraph.add_edge(
                NodeIndex::new(from.index()),
                NodeIndex::new(relation.to.index()),
                RelationId(index as u32),
            );
        }
    }
    digraph
}

/// Groups of operations that depend on each other
///
/// Includes cyclic relations; a group is either more than one operation or a
/// single operation depending on itself.
pub fn strongly_connected(digraph: &DiGraph<OperationId, RelationId>) -> Vec<Vec<OperationId>> {
    tarjan_scc(digraph)
        .into_iter()
        .filter(|scc| {
            scc.len() > 1
                || scc
                    .first()
                    .map_or(false, |idx| digraph.contains_edge(*idx, *idx))
        })
        .map(|scc| {
            let mut ops: Vec<OperationId> = scc.into_iter().map(|idx| digraph[idx]).collect();
            ops.sort();
            ops
        })
        .collect()
}

/// Kahn's algorithm over non-cyclic relations
///
/// Seeded in operation creation order so equal graphs yield equal orders.
pub fn topological_order(
    graph: &Graph,
    digraph: &DiGraph<OperationId, RelationId>,
) -> Vec<OperationId> {
    let is_ordering_edge = |rel: RelationId| !graph.relation(rel).is_cyclic();

    let mut in_degree = vec![0usize; digraph.node_count()];
    for edge in digraph.edge_references() {
        if is_ordering_edge(*edge.weight()) {
            in_degree[edge.target().index()] += 1;
        }
    }

    let mut queue: VecDeque<NodeIndex> = digraph
        .node_indices()
        .filter(|idx| in_degree[idx.index()] == 0)
        .collect();

    let mut order = Vec::with_capacity(digraph.node_count());
    let mut placed = vec![false; digraph.node_count()];
    while let Some(idx) = queue.pop_front() {
        order.push(digraph[idx]);
        placed[idx.index()] = true;
        for edge in digraph.edges_directed(idx, Direction::Outgoing) {
            if !is_ordering_edge(*edge.weight()) {
                continue;
            }
            let degree = &mut in_degree[edge.target().index()];
            *degree -= 1;
            if *degree == 0 {
                queue.push_back(edge.target());
            }
        }
    }

    if order.len() < digraph.node_count() {
        warn!(
            unplaced = digraph.node_count() - order.len(),
            "operations left in unmarked cycles, appending in creation order"
        );
        for idx in digraph.node_indices() {
            if !placed[idx.index()] {
                order.push(digraph[idx]);
            }
        }
    }
    order
}
