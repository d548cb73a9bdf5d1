//! Node builder core: lifecycle, registry helpers and generic ID expansion
//!
//! Every expansion step starts with a builder-map check, so any shape of
//! call graph above it (including cycles in the entity data) does each
//! (entity, tag) expansion exactly once per build pass.

use tracing::{debug, trace};

use crate::errors::Result;
use crate::features::builder_map::{BuildTags, BuilderMap};
use crate::features::node_builder::domain::{BuildContext, BuildStats, BuildStep};
use crate::features::node_builder::ports::PayloadProvider;
use crate::features::node_registry::{
    ComponentKey, Graph, IdNodeId, OperationFlags, OperationId, OperationKey,
    PersistentOperationKey, UpdateSource,
};
use crate::features::relation_builder::RelationBuilder;
use crate::features::scene_db::{referenced_ids, Driver, Entity, IdProperty, SceneData, SceneDatabase};
use crate::shared::models::{EntityId, IdType, LinkedState, NodeType, OpCode};

/// Expands root entities into ID, component and operation nodes
///
/// Lives for one build pass. Consumed by [`into_relation_builder`](Self::into_relation_builder),
/// so node building cannot be re-entered once relations are being added.
pub struct NodeBuilder<'a> {
    pub(super) db: &'a dyn SceneDatabase,
    pub(super) graph: &'a mut Graph,
    payloads: Option<&'a dyn PayloadProvider>,
    pub(super) built_map: BuilderMap,
    pub(super) ctx: BuildContext,
    pub(super) stats: BuildStats,
    saved_entry_tags: Vec<PersistentOperationKey>,
}

impl<'a> NodeBuilder<'a> {
    pub fn new(db: &'a dyn SceneDatabase, graph: &'a mut Graph) -> Self {
        Self {
            db,
            graph,
            payloads: None,
            built_map: BuilderMap::new(),
            ctx: BuildContext::default(),
            stats: BuildStats::new(),
            saved_entry_tags: Vec::new(),
        }
    }

    /// Attach payloads to operations as they are created
    pub fn with_payloads(mut self, payloads: &'a dyn PayloadProvider) -> Self {
        self.payloads = Some(payloads);
        self
    }

    pub fn graph(&self) -> &Graph {
        &*self.graph
    }

    pub fn built_map(&self) -> &BuilderMap {
        &self.built_map
    }

    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    pub fn context(&self) -> &BuildContext {
        &self.ctx
    }

    // ============================================================
    // Lifecycle
    // ============================================================

    /// Start a full rebuild
    ///
    /// Pending update tags are remembered by persistent key, then every
    /// node of the graph is dropped.
    pub fn begin_build(&mut self) {
        let graph = &*self.graph;
        self.saved_entry_tags = graph
            .entry_tags()
            .iter()
            .map(|op| graph.persistent_key(*op))
            .collect();
        self.graph.clear_all_nodes();
    }

    /// Finish node building; re-applies the tags saved by [`begin_build`](Self::begin_build)
    pub fn end_build(&mut self) {
        self.tag_previously_tagged_nodes();
    }

    fn tag_previously_tagged_nodes(&mut self) {
        for key in std::mem::take(&mut self.saved_entry_tags) {
            match self.graph.find_persistent(&key) {
                Some(op) => self.graph.tag_operation_update(op, UpdateSource::Relations),
                None => debug!(
                    entity = %key.entity,
                    operation = %key.operation,
                    "previously tagged operation is gone after rebuild"
                ),
            }
        }
    }

    /// Hand the graph over to relation building
    pub fn into_relation_builder(self) -> RelationBuilder<'a> {
        RelationBuilder::new(self.db, self.graph, self.stats)
    }

    // ============================================================
    // Registry helpers
    // ============================================================

    pub(super) fn entity(&self, id: EntityId) -> Option<&'a Entity> {
        let db = self.db;
        db.get(id)
    }

    /// Scene data of a build root; a root that is not a scene is a caller bug
    pub(super) fn expect_scene(&self, scene: EntityId) -> &'a SceneData {
        let db = self.db;
        match db.scene(scene) {
            Some(data) => data,
            None => panic!("build root {} is not a scene in the scene database", scene),
        }
    }

    pub(super) fn check_is_built_and_tag(&mut self, id: EntityId, tags: BuildTags) -> bool {
        let built = self.built_map.check_is_built_and_tag(id, tags);
        if built {
            self.stats.record_dedup_hit();
        }
        built
    }

    pub(super) fn record(&mut self, id: EntityId, step: BuildStep) {
        debug!(entity = %id, step = %step, "expanding");
        self.stats.record_expansion(id, step);
    }

    /// Find-or-create the ID node of `id`
    ///
    /// A new node gets its copy-on-write component (when the type has
    /// evaluated copies) and a pinned visibility operation.
    pub fn add_id_node(&mut self, id: EntityId) -> Result<IdNodeId> {
        if let Some(existing) = self.graph.find_id_node(id) {
            return Ok(existing);
        }
        let entity = match self.entity(id) {
            Some(entity) => entity,
            None => panic!("entity {} is missing from the scene database", id),
        };
        let id_type = entity.id_type();
        let id_node = self.graph.add_id_node(id, id_type, &entity.name)?;

        if id_type.needs_copy_on_write() {
            self.add_operation(id, NodeType::CopyOnWrite, OperationKey::new(OpCode::CopyOnWrite))?;
        }
        let visibility =
            self.add_operation(id, NodeType::Visibility, OperationKey::new(OpCode::Visibility))?;
        self.graph
            .operation_mut(visibility)
            .flags
            .insert(OperationFlags::PINNED);
        Ok(id_node)
    }

    /// Find-or-create an operation in the whole-ID component `node_type` of `id`
    pub(super) fn add_operation(
        &mut self,
        id: EntityId,
        node_type: NodeType,
        key: OperationKey,
    ) -> Result<OperationId> {
        let id_node = self.add_id_node(id)?;
        let component = self.graph.add_component_node(id_node, node_type, "")?;
        if let Some(existing) = self.graph.find_operation(component, &key) {
            return Ok(existing);
        }
        let payload = self
            .payloads
            .and_then(|p| p.payload(id, &ComponentKey::new(node_type), &key));
        self.graph.add_operation_node(component, key, payload)
    }

    pub(super) fn add_op(&mut self, id: EntityId, node_type: NodeType, opcode: OpCode) -> Result<OperationId> {
        self.add_operation(id, node_type, OperationKey::new(opcode))
    }

    pub(super) fn add_entry_op(&mut self, id: EntityId, node_type: NodeType, opcode: OpCode) -> Result<OperationId> {
        let op = self.add_op(id, node_type, opcode)?;
        self.graph.set_entry_operation(op);
        Ok(op)
    }

    pub(super) fn add_exit_op(&mut self, id: EntityId, node_type: NodeType, opcode: OpCode) -> Result<OperationId> {
        let op = self.add_op(id, node_type, opcode)?;
        self.graph.set_exit_operation(op);
        Ok(op)
    }

    // ============================================================
    // Generic ID expansion
    // ============================================================

    /// Dispatch on the entity type; dangling references are skipped
    pub fn build_id(&mut self, id: EntityId) -> Result<()> {
        let entity = match self.entity(id) {
            Some(entity) => entity,
            None => {
                debug!(entity = %id, "skipping dangling entity reference");
                return Ok(());
            }
        };
        match entity.id_type() {
            IdType::Scene => self.build_scene_parameters(id),
            IdType::Object => self.build_object(None, id, LinkedState::Indirectly, false),
            IdType::NodeTree => self.build_nodetree(id),
            IdType::Camera => self.build_camera(id),
            IdType::Light => self.build_light(id),
            IdType::Material => self.build_material(id),
            IdType::World => self.build_world(id),
            IdType::Collection => self.build_collection(None, id),
            IdType::Action => self.build_action(id),
            IdType::Sound => self.build_sound(id),
            IdType::Speaker => self.build_speaker(id),
            IdType::Mesh | IdType::Curve => self.build_object_data_geometry_datablock(id),
            IdType::Image => self.build_image(id),
            IdType::Texture => self.build_texture(id),
            IdType::Mask => self.build_mask(id),
            IdType::MovieClip => self.build_movieclip(id),
            IdType::CacheFile => self.build_cachefile(id),
            IdType::VFont => self.build_vfont(id),
            // Script text is never evaluated
            IdType::Text => Ok(()),
            IdType::Library | IdType::Brush | IdType::Palette => self.build_generic_id(id),
        }
    }

    /// Expand an explicitly requested entity; it ends up linked `Directly`
    ///
    /// Objects are built visible, as if they had a base in the view layer.
    pub fn build_root(&mut self, id: EntityId) -> Result<()> {
        match self.db.id_type(id) {
            Some(IdType::Object) => self.build_object(None, id, LinkedState::Directly, true)?,
            _ => self.build_id(id)?,
        }
        if let Some(id_node) = self.graph.find_id_node(id) {
            self.graph
                .id_node_mut(id_node)
                .upgrade_linked_state(LinkedState::Directly);
        }
        Ok(())
    }

    /// Types without a dedicated builder: parameters, properties and animation only
    pub fn build_generic_id(&mut self, id: EntityId) -> Result<()> {
        if self.check_is_built_and_tag(id, BuildTags::COMPLETE) {
            return Ok(());
        }
        let entity = match self.entity(id) {
            Some(entity) => entity,
            None => return Ok(()),
        };
        self.record(id, BuildStep::GenericId);
        self.add_id_node(id)?;
        self.build_idproperties(&entity.properties)?;
        self.build_animdata_nodes(id)?;
        self.build_parameters(id)
    }

    /// Follow every entity reference stored in custom properties
    pub fn build_idproperties(&mut self, properties: &'a [IdProperty]) -> Result<()> {
        for id in referenced_ids(properties) {
            self.build_id(id)?;
        }
        Ok(())
    }

    /// Parameters component: entry, eval and exit
    ///
    /// Not guarded: every call after the first finds the same operations.
    pub fn build_parameters(&mut self, id: EntityId) -> Result<()> {
        self.add_entry_op(id, NodeType::Parameters, OpCode::ParametersEntry)?;
        self.add_op(id, NodeType::Parameters, OpCode::ParametersEval)?;
        self.add_exit_op(id, NodeType::Parameters, OpCode::ParametersExit)?;
        Ok(())
    }

    // ============================================================
    // Animation
    // ============================================================

    /// Animation component, NLA strip actions and drivers of `id`
    pub fn build_animdata(&mut self, id: EntityId) -> Result<()> {
        if self.check_is_built_and_tag(id, BuildTags::ANIMATION) {
            return Ok(());
        }
        self.build_animdata_nodes(id)
    }

    /// Unguarded body of [`build_animdata`](Self::build_animdata)
    ///
    /// Called directly by whole-entity builders: their `COMPLETE` tag
    /// already covers the animation bit.
    pub(super) fn build_animdata_nodes(&mut self, id: EntityId) -> Result<()> {
        let db = self.db;
        let anim_data = match db.anim_data(id) {
            Some(anim_data) => anim_data,
            None => return Ok(()),
        };
        self.record(id, BuildStep::Animation);

        if let Some(action) = anim_data.action {
            self.build_action(action)?;
        }
        if anim_data.has_animation() {
            self.add_entry_op(id, NodeType::Animation, OpCode::AnimationEntry)?;
            self.add_op(id, NodeType::Animation, OpCode::AnimationEval)?;
            self.add_exit_op(id, NodeType::Animation, OpCode::AnimationExit)?;
            for strip_action in &anim_data.nla_strips {
                self.build_action(*strip_action)?;
            }
        }
        for driver in &anim_data.drivers {
            self.build_driver(id, driver)?;
        }
        Ok(())
    }

    pub fn build_action(&mut self, action: EntityId) -> Result<()> {
        if self.check_is_built_and_tag(action, BuildTags::COMPLETE) {
            return Ok(());
        }
        let entity = match self.entity(action) {
            Some(entity) => entity,
            None => return Ok(()),
        };
        self.record(action, BuildStep::Action);
        self.build_idproperties(&entity.properties)?;
        self.add_op(action, NodeType::Animation, OpCode::AnimationEval)?;
        Ok(())
    }

    /// One driver operation per (path, index), plus its variable targets
    fn build_driver(&mut self, owner: EntityId, driver: &'a Driver) -> Result<()> {
        let key = OperationKey::named(OpCode::Driver, driver.rna_path.as_str(), driver.array_index);
        self.add_operation(owner, NodeType::Parameters, key)?;
        for variable in &driver.variables {
            for target in &variable.targets {
                if *target == owner {
                    trace!(entity = %owner, driver = %driver.rna_path, "driver reads its own entity");
                    continue;
                }
                self.build_id(*target)?;
            }
        }
        Ok(())
    }
}
