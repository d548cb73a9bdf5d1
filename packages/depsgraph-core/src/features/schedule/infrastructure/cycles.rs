//! Dependency cycle detection
//!
//! Iterative depth-first walk over operation relations. A relation reaching
//! an operation that is still on the walk stack closes a loop; it is marked
//! [`RelationFlags::CYCLIC`] so ordering and flushing can ignore it.

use tracing::warn;

use crate::features::node_registry::{Graph, OperationId, RelationFlags, RelationId, RelationSource};
use crate::features::schedule::domain::CycleInfo;

#[derive(Clone, Copy, PartialEq, Eq)]
enum VisitState {
    Unvisited,
    OnStack,
    Done,
}

/// Mark every loop-closing relation cyclic and report each loop once
pub fn detect_cycles(graph: &mut Graph) -> Vec<CycleInfo> {
    let op_count = graph.operations().len();
    let mut state = vec![VisitState::Unvisited; op_count];
    let mut cycles = Vec::new();

    // Roots first so the reported relation is the one closing the loop
    // rather than an arbitrary edge inside it
    let roots: Vec<OperationId> = graph
        .operation_ids()
        .filter(|op| !has_operation_inlinks(graph, *op))
        .collect();
    let rest: Vec<OperationId> = graph.operation_ids().collect();

    for start in roots.into_iter().chain(rest) {
        if state[start.index()] != VisitState::Unvisited {
            continue;
        }
        walk(graph, start, &mut state, &mut cycles);
    }

    cycles
}

fn has_operation_inlinks(graph: &Graph, op: OperationId) -> bool {
    graph
        .operation(op)
        .inlinks()
        .iter()
        .any(|rel| matches!(graph.relation(*rel).from, RelationSource::Operation(_)))
}

fn walk(
    graph: &mut Graph,
    start: OperationId,
    state: &mut [VisitState],
    cycles: &mut Vec<CycleInfo>,
) {
    // (operation, index of the next outlink to follow)
    let mut stack: Vec<(OperationId, usize)> = vec![(start, 0)];
    state[start.index()] = VisitState::OnStack;

    while let Some((op, next)) = stack.last().copied() {
        let rel = match graph.operation(op).outlinks().get(next) {
            Some(rel) => *rel,
            None => {
                state[op.index()] = VisitState::Done;
                stack.pop();
                continue;
            }
        };
        if let Some(top) = stack.last_mut() {
            top.1 += 1;
        }

        let relation = graph.relation(rel);
        if relation.is_cyclic() {
            continue;
        }
        let target = relation.to;
        match state[target.index()] {
            VisitState::Unvisited => {
                state[target.index()] = VisitState::OnStack;
                stack.push((target, 0));
            }
            VisitState::OnStack => {
                let from = stack
                    .iter()
                    .position(|(on_stack, _)| *on_stack == target)
                    .unwrap_or(0);
                let path: Vec<OperationId> = stack[from..].iter().map(|(op, _)| *op).collect();
                report_cycle(graph, rel, &path);
                graph.relation_mut(rel).flags.insert(RelationFlags::CYCLIC);
                cycles.push(CycleInfo { relation: rel, path });
            }
            VisitState::Done => {}
        }
    }
}

fn report_cycle(graph: &Graph, rel: RelationId, path: &[OperationId]) {
    let mut description = String::new();
    for op in path {
        description.push_str(&graph.operation_label(*op));
        description.push_str(" -> ");
    }
    if let Some(first) = path.first() {
        description.push_str(&graph.operation_label(*first));
    }
    warn!(
        relation = %graph.relation(rel).name,
        "dependency cycle detected: {}",
        description
    );
}
