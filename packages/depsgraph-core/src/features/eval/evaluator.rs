//! Run operation payloads in schedule order

use tracing::{debug, trace};

use crate::errors::{DepsgraphError, Result};
use crate::features::eval::flush::{clear_update_flags, flush_updates, FlushStats};
use crate::features::node_registry::{EvalContext, Graph};
use crate::features::schedule::Schedule;
use crate::pipeline::Depsgraph;

/// Counters of one evaluation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvalStats {
    pub flush: FlushStats,
    /// Operations that were due and had a payload
    pub evaluated: usize,
    /// Operations that were due but carry no payload
    pub without_payload: usize,
}

pub struct Evaluator;

impl Evaluator {
    /// Flush pending tags and evaluate the depsgraph at `frame`
    ///
    /// Fails when the graph needs a relations update first.
    pub fn evaluate(depsgraph: &mut Depsgraph, frame: f32) -> Result<EvalStats> {
        if depsgraph.need_update() {
            return Err(DepsgraphError::RelationsOutdated);
        }
        depsgraph.set_frame(frame);
        let (graph, schedule) = depsgraph.graph_and_schedule_mut();
        Ok(Self::evaluate_graph(graph, schedule, frame))
    }

    /// Evaluate a bare graph against a precomputed schedule
    pub fn evaluate_graph(graph: &mut Graph, schedule: &Schedule, frame: f32) -> EvalStats {
        let flush = flush_updates(graph);
        let mut stats = EvalStats {
            flush,
            ..EvalStats::default()
        };

        for op in schedule.order() {
            let node = graph.operation(*op);
            if !node.needs_update() {
                continue;
            }
            match node.payload() {
                Some(payload) => {
                    let ctx = EvalContext {
                        frame,
                        entity: node.entity(),
                        operation: *op,
                    };
                    trace!(operation = %node.key, entity = ?node.entity(), "evaluate");
                    (**payload)(&ctx);
                    stats.evaluated += 1;
                }
                None => stats.without_payload += 1,
            }
        }

        clear_update_flags(graph);
        debug!(
            frame,
            evaluated = stats.evaluated,
            without_payload = stats.without_payload,
            "evaluation done"
        );
        stats
    }
}
