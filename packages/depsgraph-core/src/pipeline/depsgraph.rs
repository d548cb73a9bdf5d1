//! The built dependency graph of one scene and view layer

use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{BuildConfig, DebugConfig};
use crate::errors::Result;
use crate::features::debug::{consistency_check, to_graphviz, GraphStats};
use crate::features::node_builder::{BuildStats, NodeBuilder};
use crate::features::node_registry::{Graph, PersistentOperationKey, UpdateSource};
use crate::features::scene_db::SceneDatabase;
use crate::features::schedule::Schedule;
use crate::features::tagging::{self, Recalc};
use crate::shared::models::{EntityId, EvaluationMode};
use depsgraph_alloc::GuardedAllocator;

/// Graph, schedule and update state for one (scene, view layer) pair
///
/// Produced by the pipelines in this module. Until the first successful
/// build, and after any failed one, [`need_update`](Self::need_update) is true.
pub struct Depsgraph {
    graph: Graph,
    scene: EntityId,
    view_layer: String,
    mode: EvaluationMode,
    need_update: bool,
    frame: f32,
    schedule: Schedule,
    stats: BuildStats,
    debug: DebugConfig,
    alloc: Arc<GuardedAllocator>,
}

impl Depsgraph {
    pub fn new(scene: EntityId, view_layer: &str, config: &BuildConfig) -> Self {
        let alloc = config.allocator();
        Self {
            graph: Graph::new(config.mode, alloc.clone()),
            scene,
            view_layer: view_layer.to_string(),
            mode: config.mode,
            need_update: true,
            frame: 0.0,
            schedule: Schedule::default(),
            stats: BuildStats::new(),
            debug: config.debug,
            alloc,
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub(crate) fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    pub(crate) fn graph_and_schedule_mut(&mut self) -> (&mut Graph, &Schedule) {
        (&mut self.graph, &self.schedule)
    }

    pub fn scene(&self) -> EntityId {
        self.scene
    }

    pub fn view_layer(&self) -> &str {
        &self.view_layer
    }

    pub fn mode(&self) -> EvaluationMode {
        self.mode
    }

    /// Relations or schedule are stale
    pub fn need_update(&self) -> bool {
        self.need_update
    }

    pub fn frame(&self) -> f32 {
        self.frame
    }

    pub(crate) fn set_frame(&mut self, frame: f32) {
        self.frame = frame;
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Node builder counters, accumulated over incremental rebuilds
    pub fn build_stats(&self) -> &BuildStats {
        &self.stats
    }

    pub fn allocator(&self) -> &Arc<GuardedAllocator> {
        &self.alloc
    }

    // ============================================================
    // Tagging
    // ============================================================

    /// User edit on the components of `entity` addressed by `recalc`
    pub fn tag_id(&mut self, entity: EntityId, recalc: Recalc) -> usize {
        tagging::tag_id(&mut self.graph, entity, recalc, UpdateSource::UserEdit)
    }

    pub fn tag_operation(&mut self, key: &PersistentOperationKey) -> bool {
        tagging::tag_operation(&mut self.graph, key, UpdateSource::UserEdit)
    }

    /// Frame change
    pub fn tag_time_source(&mut self) -> usize {
        tagging::tag_time_source(&mut self.graph)
    }

    /// Entity references changed; relations must be rebuilt before evaluation
    pub fn tag_relations_update(&mut self) {
        self.need_update = true;
    }

    // ============================================================
    // Building
    // ============================================================

    /// Incremental merge: expand `roots` into the existing graph
    ///
    /// Existing nodes and update tags are kept and reused; a fresh builder
    /// map lets already present entities be visited again so newly added
    /// references are picked up. Roots are linked `Directly`, as in a full
    /// build. Relations and the schedule are rebuilt from scratch. Removing
    /// entities requires a full pipeline rebuild.
    pub fn rebuild_for(&mut self, db: &dyn SceneDatabase, roots: &[EntityId]) -> Result<()> {
        self.need_update = true;
        self.graph.clear_relations();
        let stats = {
            let mut builder = NodeBuilder::new(db, &mut self.graph);
            for root in roots {
                builder.build_root(*root)?;
            }
            let mut relations = builder.into_relation_builder();
            relations.build_relations()?;
            relations.finish()
        };
        self.stats.merge(&stats);
        self.finalize("incremental");
        Ok(())
    }

    /// Schedule, optional consistency check, stats log; clears `need_update`
    pub(crate) fn finalize(&mut self, pipeline: &str) {
        self.schedule = Schedule::build(&mut self.graph);
        if self.debug.consistency_check {
            let problems = consistency_check(&self.graph);
            if !problems.is_empty() {
                warn!(pipeline, problems = problems.len(), "depsgraph failed consistency check");
            }
        }
        let stats = GraphStats::collect(&self.graph);
        info!(
            pipeline,
            scene = %self.scene,
            view_layer = %self.view_layer,
            id_nodes = stats.id_nodes,
            operations = stats.operations,
            relations = stats.relations,
            cycles = stats.cyclic_relations,
            "depsgraph built"
        );
        if self.debug.log_stats {
            if let Ok(json) = stats.to_json() {
                info!(pipeline, "depsgraph stats: {}", json);
            }
        }
        self.need_update = false;
    }

    pub(crate) fn replace_stats(&mut self, stats: BuildStats) {
        self.stats = stats;
    }

    pub(crate) fn retarget(&mut self, scene: EntityId, view_layer: &str) {
        if self.scene != scene || self.view_layer != view_layer {
            debug!(from = %self.scene, to = %scene, view_layer, "depsgraph retargeted");
            self.scene = scene;
            self.view_layer = view_layer.to_string();
        }
    }

    pub(crate) fn mark_need_update(&mut self) {
        self.need_update = true;
    }

    // ============================================================
    // Debug
    // ============================================================

    pub fn graph_stats(&self) -> GraphStats {
        GraphStats::collect(&self.graph)
    }

    pub fn consistency_check(&self) -> Vec<String> {
        consistency_check(&self.graph)
    }

    pub fn to_graphviz(&self) -> String {
        to_graphviz(&self.graph, &format!("{} / {}", self.scene, self.view_layer))
    }

    /// Write the DOT text of [`to_graphviz`](Self::to_graphviz) to `path`
    pub fn write_graphviz(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_graphviz())?;
        Ok(())
    }
}

impl std::fmt::Debug for Depsgraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Depsgraph")
            .field("scene", &self.scene)
            .field("view_layer", &self.view_layer)
            .field("mode", &self.mode)
            .field("need_update", &self.need_update)
            .field("frame", &self.frame)
            .field("graph", &self.graph)
            .finish()
    }
}
