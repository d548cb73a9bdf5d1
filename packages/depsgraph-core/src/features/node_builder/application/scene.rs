//! Scene-level expansion: render root, view layers, parameters, compositor,
//! audio, sequencer and speakers
//!
//! Several of these steps are reachable from more than one call site (the
//! compositor from parameters and from the render flag, parameters from
//! render and view layer, audio from render, sequencer and view layer). The
//! builder-map tag makes the first caller do the work and turns every later
//! call into a no-op.

use tracing::debug;

use super::builder::NodeBuilder;
use crate::errors::Result;
use crate::features::builder_map::BuildTags;
use crate::features::node_builder::domain::BuildStep;
use crate::features::scene_db::{EntityData, LayerCollection, SceneData, ViewLayer};
use crate::shared::models::{EntityId, IdType, LinkedState, NodeType, OpCode};

impl<'a> NodeBuilder<'a> {
    // ============================================================
    // Roots
    // ============================================================

    /// Expand a scene for final render
    ///
    /// # Panics
    /// When `scene` is not a scene or has no view layer named `view_layer`.
    pub fn build_scene_render(&mut self, scene: EntityId, view_layer: &str) -> Result<()> {
        let scene_data = self.expect_scene(scene);
        let layer = match scene_data.view_layer(view_layer) {
            Some(layer) => layer,
            None => panic!("scene {} has no view layer {:?}", scene, view_layer),
        };
        self.record(scene, BuildStep::SceneRender);

        self.ctx.scene = Some(scene);
        self.ctx.view_layer = Some(view_layer.to_string());
        let build_compositor = scene_data.render.use_compositor();
        let build_sequencer = scene_data.render.use_sequencer();

        let id_node = self.add_id_node(scene)?;
        self.graph
            .id_node_mut(id_node)
            .upgrade_linked_state(LinkedState::Directly);
        self.graph.add_time_source()?;

        self.build_animdata(scene)?;
        self.build_scene_parameters(scene)?;
        self.build_scene_audio(scene)?;
        if build_compositor {
            self.build_scene_compositor(scene)?;
        }
        if build_sequencer {
            self.build_scene_sequencer(scene)?;
            self.build_scene_speakers(scene, layer)?;
        }
        if let Some(camera) = scene_data.camera {
            self.build_object(None, camera, LinkedState::Directly, true)?;
        }
        Ok(())
    }

    /// Expand a scene as seen through one view layer
    ///
    /// # Panics
    /// When `scene` is not a scene or has no view layer named `view_layer`.
    pub fn build_view_layer(
        &mut self,
        scene: EntityId,
        view_layer: &str,
        linked_state: LinkedState,
    ) -> Result<()> {
        let scene_data = self.expect_scene(scene);
        let layer = match scene_data.view_layer(view_layer) {
            Some(layer) => layer,
            None => panic!("scene {} has no view layer {:?}", scene, view_layer),
        };
        self.build_view_layer_data(scene, scene_data, layer, linked_state)
    }

    fn build_view_layer_data(
        &mut self,
        scene: EntityId,
        scene_data: &'a SceneData,
        view_layer: &'a ViewLayer,
        linked_state: LinkedState,
    ) -> Result<()> {
        self.record(scene, BuildStep::ViewLayer);
        let id_node = self.add_id_node(scene)?;
        self.graph.id_node_mut(id_node).upgrade_linked_state(linked_state);
        self.graph.add_time_source()?;

        let saved = self.ctx.enter_scene(scene, &view_layer.name);
        let mode = self.graph.mode();

        for (index, base) in view_layer.bases.iter().enumerate() {
            if !base.is_enabled(mode) {
                continue;
            }
            self.build_object(Some(index), base.object, linked_state, true)?;
        }
        self.build_layer_collections(&view_layer.layer_collections)?;

        if let Some(camera) = scene_data.camera {
            self.build_object(None, camera, LinkedState::Indirectly, true)?;
        }
        if self.db.anim_data(scene).is_some() {
            self.build_animdata(scene)?;
        }
        if let Some(world) = scene_data.world {
            self.build_world(world)?;
        }

        let db = self.db;
        for cache_file in db.entities_of_type(IdType::CacheFile) {
            self.build_cachefile(cache_file)?;
        }
        for mask in db.entities_of_type(IdType::Mask) {
            self.build_mask(mask)?;
        }
        for clip in db.entities_of_type(IdType::MovieClip) {
            self.build_movieclip(clip)?;
        }
        if let Some(material) = view_layer.material_override {
            self.build_material(material)?;
        }

        // Sound and strips only play for the scene the user works in
        if linked_state == LinkedState::Directly {
            self.build_scene_audio(scene)?;
            self.build_scene_sequencer(scene)?;
        }

        self.add_op(scene, NodeType::LayerCollections, OpCode::ViewLayerEval)?;
        self.build_scene_compositor(scene)?;
        self.build_scene_parameters(scene)?;

        if let Some(set) = scene_data.background_set {
            if !self.check_is_built_and_tag(scene, BuildTags::SCENE_SET) {
                match db.scene(set).and_then(|s| s.default_render_layer().map(|l| (s, l))) {
                    Some((set_data, set_layer)) => {
                        self.build_view_layer_data(set, set_data, set_layer, LinkedState::ViaSet)?;
                    }
                    None => debug!(scene = %scene, set = %set, "background set has no usable view layer"),
                }
            }
        }

        self.ctx.restore(saved);
        Ok(())
    }

    /// Expand only `ids` (plus the scene parameters) as seen from one view layer
    ///
    /// Objects among `ids` are linked directly and visible; anything else
    /// goes through [`build_id`](Self::build_id).
    ///
    /// # Panics
    /// When `scene` is not a scene or has no view layer named `view_layer`.
    pub fn build_from_ids(&mut self, scene: EntityId, view_layer: &str, ids: &[EntityId]) -> Result<()> {
        let scene_data = self.expect_scene(scene);
        if scene_data.view_layer(view_layer).is_none() {
            panic!("scene {} has no view layer {:?}", scene, view_layer);
        }
        self.record(scene, BuildStep::FromIds);
        let id_node = self.add_id_node(scene)?;
        self.graph
            .id_node_mut(id_node)
            .upgrade_linked_state(LinkedState::Directly);
        self.graph.add_time_source()?;

        let saved = self.ctx.enter_scene(scene, view_layer);
        self.build_scene_parameters(scene)?;
        for id in ids {
            self.build_root(*id)?;
        }
        self.ctx.restore(saved);
        Ok(())
    }

    /// Collections linked into a view layer; excluded ones are skipped but
    /// their children are still visited
    pub(super) fn build_layer_collections(&mut self, layer_collections: &'a [LayerCollection]) -> Result<()> {
        let db = self.db;
        let mode = self.graph.mode();
        for layer_collection in layer_collections {
            let collection = match db.collection(layer_collection.collection) {
                Some(collection) => collection,
                None => continue,
            };
            if collection.is_hidden(mode) {
                continue;
            }
            if !layer_collection.excluded {
                self.build_collection(Some(layer_collection), layer_collection.collection)?;
            }
            self.build_layer_collections(&layer_collection.children)?;
        }
        Ok(())
    }

    // ============================================================
    // Scene components
    // ============================================================

    /// Scene parameters, scene evaluation and (always) the compositor
    pub fn build_scene_parameters(&mut self, scene: EntityId) -> Result<()> {
        let entity = match self.entity(scene) {
            Some(entity) => entity,
            None => return Ok(()),
        };
        let scene_data = match &entity.data {
            EntityData::Scene(scene_data) => scene_data,
            _ => return Ok(()),
        };
        if self.check_is_built_and_tag(scene, BuildTags::PARAMETERS) {
            return Ok(());
        }
        self.record(scene, BuildStep::SceneParameters);

        self.build_parameters(scene)?;
        self.build_idproperties(&entity.properties)?;
        self.add_op(scene, NodeType::Parameters, OpCode::SceneEval)?;

        // The compositor tree may reference this scene back; without it the
        // graph would miss nodes even when compositing is off.
        self.build_scene_compositor(scene)?;

        for marker in &scene_data.markers {
            self.build_idproperties(&marker.properties)?;
        }
        Ok(())
    }

    pub fn build_scene_compositor(&mut self, scene: EntityId) -> Result<()> {
        let db = self.db;
        if self.check_is_built_and_tag(scene, BuildTags::SCENE_COMPOSITOR) {
            return Ok(());
        }
        let tree = match db.scene(scene).and_then(|s| s.compositor_tree) {
            Some(tree) => tree,
            None => return Ok(()),
        };
        self.record(scene, BuildStep::SceneCompositor);
        self.build_nodetree(tree)
    }

    pub fn build_scene_audio(&mut self, scene: EntityId) -> Result<()> {
        let db = self.db;
        if db.scene(scene).map_or(true, |s| s.audio.is_none()) {
            return Ok(());
        }
        if self.check_is_built_and_tag(scene, BuildTags::SCENE_AUDIO) {
            return Ok(());
        }
        self.record(scene, BuildStep::SceneAudio);
        self.add_entry_op(scene, NodeType::Audio, OpCode::AudioEntry)?;
        self.add_op(scene, NodeType::Audio, OpCode::SoundEval)?;
        self.add_exit_op(scene, NodeType::Audio, OpCode::AudioVolume)?;
        Ok(())
    }

    pub fn build_scene_sequencer(&mut self, scene: EntityId) -> Result<()> {
        let db = self.db;
        let sequencer = match db.scene(scene).and_then(|s| s.sequencer.as_ref()) {
            Some(sequencer) => sequencer,
            None => return Ok(()),
        };
        if self.check_is_built_and_tag(scene, BuildTags::SCENE_SEQUENCER) {
            return Ok(());
        }
        self.record(scene, BuildStep::SceneSequencer);
        self.build_scene_audio(scene)?;
        self.add_op(scene, NodeType::Sequencer, OpCode::SequencesEval)?;

        for strip in &sequencer.strips {
            self.build_idproperties(&strip.properties)?;
            if let Some(sound) = strip.sound {
                self.build_sound(sound)?;
            }
            if let Some(strip_scene) = strip.scene {
                self.build_scene_parameters(strip_scene)?;
                if strip.scene_strips {
                    self.build_scene_sequencer(strip_scene)?;
                }
                if let Some(layer) = db.scene(strip_scene).and_then(SceneData::default_render_layer) {
                    self.build_scene_speakers(strip_scene, layer)?;
                }
            }
        }
        Ok(())
    }

    /// Speaker objects enabled in `view_layer`
    pub(super) fn build_scene_speakers(&mut self, scene: EntityId, view_layer: &'a ViewLayer) -> Result<()> {
        if self.check_is_built_and_tag(scene, BuildTags::SCENE_SPEAKERS) {
            return Ok(());
        }
        self.record(scene, BuildStep::SceneSpeakers);
        let db = self.db;
        let mode = self.graph.mode();
        for base in &view_layer.bases {
            if !base.is_enabled(mode) {
                continue;
            }
            let is_speaker = db
                .object(base.object)
                .and_then(|ob| ob.data)
                .and_then(|data| db.id_type(data))
                == Some(IdType::Speaker);
            if is_speaker {
                self.build_object(None, base.object, LinkedState::Indirectly, false)?;
            }
        }
        Ok(())
    }
}
