//! Build pipelines
//!
//! Every pipeline runs the same steps:
//! 1. sanity check of the roots (recoverable errors)
//! 2. nodes: begin build, expand roots, end build
//! 3. relations
//! 4. finalize: schedule, optional consistency check, stats log
//!
//! Only what the roots are differs, so each pipeline implements
//! [`PipelineSteps`] and shares [`run`].

use tracing::debug;

use crate::config::BuildConfig;
use crate::errors::{DepsgraphError, Result};
use crate::features::node_builder::{NodeBuilder, PayloadProvider};
use crate::features::scene_db::SceneDatabase;
use crate::pipeline::Depsgraph;
use crate::shared::models::{EntityId, IdType, LinkedState};

/// Root selection of one pipeline
pub trait PipelineSteps {
    fn name(&self) -> &'static str;

    /// Validate roots; runs before anything touches the graph
    fn sanity_check(&self, db: &dyn SceneDatabase) -> Result<()>;

    fn build_nodes(&self, builder: &mut NodeBuilder<'_>) -> Result<()>;
}

/// Scene root and named view layer must exist
fn check_scene_view_layer(db: &dyn SceneDatabase, scene: EntityId, view_layer: &str) -> Result<()> {
    let scene_data = db.scene(scene).ok_or(DepsgraphError::NotAScene(scene))?;
    if scene_data.view_layer(view_layer).is_none() {
        return Err(DepsgraphError::ViewLayerNotFound {
            scene,
            name: view_layer.to_string(),
        });
    }
    Ok(())
}

/// Full rebuild of `depsgraph` with `steps`, rooted at `scene` / `view_layer`
///
/// Update tags present before the rebuild are re-applied to the new nodes.
/// On error the graph stays partially built with `need_update` set.
pub fn run(
    steps: &dyn PipelineSteps,
    db: &dyn SceneDatabase,
    payloads: Option<&dyn PayloadProvider>,
    (scene, view_layer): (EntityId, &str),
    depsgraph: &mut Depsgraph,
) -> Result<()> {
    steps.sanity_check(db)?;
    depsgraph.retarget(scene, view_layer);
    depsgraph.mark_need_update();
    debug!(pipeline = steps.name(), scene = %depsgraph.scene(), "building depsgraph");

    let stats = {
        let mut builder = NodeBuilder::new(db, depsgraph.graph_mut());
        if let Some(payloads) = payloads {
            builder = builder.with_payloads(payloads);
        }
        builder.begin_build();
        steps.build_nodes(&mut builder)?;
        builder.end_build();

        let mut relations = builder.into_relation_builder();
        relations.build_relations()?;
        relations.finish()
    };
    depsgraph.replace_stats(stats);
    depsgraph.finalize(steps.name());
    Ok(())
}

macro_rules! pipeline_common {
    ($ty:ident) => {
        impl<'a> $ty<'a> {
            /// Attach operation payloads while building
            pub fn with_payloads(mut self, payloads: &'a dyn PayloadProvider) -> Self {
                self.payloads = Some(payloads);
                self
            }

            /// Build a new depsgraph
            pub fn build(self) -> Result<Depsgraph> {
                self.config.validate()?;
                let mut depsgraph = Depsgraph::new(self.scene, self.view_layer, self.config);
                run(&self, self.db, self.payloads, (self.scene, self.view_layer), &mut depsgraph)?;
                Ok(depsgraph)
            }

            /// Rebuild an existing depsgraph in place, keeping its update tags
            ///
            /// The depsgraph takes over this pipeline's scene and view layer.
            pub fn build_into(self, depsgraph: &mut Depsgraph) -> Result<()> {
                self.config.validate()?;
                run(&self, self.db, self.payloads, (self.scene, self.view_layer), depsgraph)
            }
        }
    };
}

// ============================================================
// View layer
// ============================================================

/// Everything visible through one view layer of a scene
pub struct ViewLayerPipeline<'a> {
    db: &'a dyn SceneDatabase,
    scene: EntityId,
    view_layer: &'a str,
    config: &'a BuildConfig,
    payloads: Option<&'a dyn PayloadProvider>,
}

impl<'a> ViewLayerPipeline<'a> {
    pub fn new(db: &'a dyn SceneDatabase, scene: EntityId, view_layer: &'a str, config: &'a BuildConfig) -> Self {
        Self {
            db,
            scene,
            view_layer,
            config,
            payloads: None,
        }
    }
}

pipeline_common!(ViewLayerPipeline);

impl PipelineSteps for ViewLayerPipeline<'_> {
    fn name(&self) -> &'static str {
        "view_layer"
    }

    fn sanity_check(&self, db: &dyn SceneDatabase) -> Result<()> {
        check_scene_view_layer(db, self.scene, self.view_layer)
    }

    fn build_nodes(&self, builder: &mut NodeBuilder<'_>) -> Result<()> {
        builder.build_view_layer(self.scene, self.view_layer, LinkedState::Directly)
    }
}

// ============================================================
// Render
// ============================================================

/// Final render: scene parameters, compositor and sequencer per render
/// settings, and the scene camera
pub struct RenderPipeline<'a> {
    db: &'a dyn SceneDatabase,
    scene: EntityId,
    view_layer: &'a str,
    config: &'a BuildConfig,
    payloads: Option<&'a dyn PayloadProvider>,
}

impl<'a> RenderPipeline<'a> {
    pub fn new(db: &'a dyn SceneDatabase, scene: EntityId, view_layer: &'a str, config: &'a BuildConfig) -> Self {
        Self {
            db,
            scene,
            view_layer,
            config,
            payloads: None,
        }
    }
}

pipeline_common!(RenderPipeline);

impl PipelineSteps for RenderPipeline<'_> {
    fn name(&self) -> &'static str {
        "render"
    }

    fn sanity_check(&self, db: &dyn SceneDatabase) -> Result<()> {
        check_scene_view_layer(db, self.scene, self.view_layer)
    }

    fn build_nodes(&self, builder: &mut NodeBuilder<'_>) -> Result<()> {
        builder.build_scene_render(self.scene, self.view_layer)
    }
}

// ============================================================
// Compositor
// ============================================================

/// Render graph plus a node tree that is not (yet) the scene's compositor
pub struct CompositorPipeline<'a> {
    db: &'a dyn SceneDatabase,
    scene: EntityId,
    view_layer: &'a str,
    nodetree: EntityId,
    config: &'a BuildConfig,
    payloads: Option<&'a dyn PayloadProvider>,
}

impl<'a> CompositorPipeline<'a> {
    pub fn new(
        db: &'a dyn SceneDatabase,
        scene: EntityId,
        view_layer: &'a str,
        nodetree: EntityId,
        config: &'a BuildConfig,
    ) -> Self {
        Self {
            db,
            scene,
            view_layer,
            nodetree,
            config,
            payloads: None,
        }
    }
}

pipeline_common!(CompositorPipeline);

impl PipelineSteps for CompositorPipeline<'_> {
    fn name(&self) -> &'static str {
        "compositor"
    }

    fn sanity_check(&self, db: &dyn SceneDatabase) -> Result<()> {
        check_scene_view_layer(db, self.scene, self.view_layer)?;
        if db.id_type(self.nodetree) != Some(IdType::NodeTree) {
            return Err(DepsgraphError::NotANodeTree(self.nodetree));
        }
        Ok(())
    }

    fn build_nodes(&self, builder: &mut NodeBuilder<'_>) -> Result<()> {
        builder.build_scene_render(self.scene, self.view_layer)?;
        builder.build_nodetree(self.nodetree)
    }
}

// ============================================================
// From ids
// ============================================================

/// Only the given entities and what they depend on
pub struct FromIdsPipeline<'a> {
    db: &'a dyn SceneDatabase,
    scene: EntityId,
    view_layer: &'a str,
    ids: &'a [EntityId],
    config: &'a BuildConfig,
    payloads: Option<&'a dyn PayloadProvider>,
}

impl<'a> FromIdsPipeline<'a> {
    pub fn new(
        db: &'a dyn SceneDatabase,
        scene: EntityId,
        view_layer: &'a str,
        ids: &'a [EntityId],
        config: &'a BuildConfig,
    ) -> Self {
        Self {
            db,
            scene,
            view_layer,
            ids,
            config,
            payloads: None,
        }
    }
}

pipeline_common!(FromIdsPipeline);

impl PipelineSteps for FromIdsPipeline<'_> {
    fn name(&self) -> &'static str {
        "from_ids"
    }

    fn sanity_check(&self, db: &dyn SceneDatabase) -> Result<()> {
        check_scene_view_layer(db, self.scene, self.view_layer)
    }

    fn build_nodes(&self, builder: &mut NodeBuilder<'_>) -> Result<()> {
        builder.build_from_ids(self.scene, self.view_layer, self.ids)
    }
}
