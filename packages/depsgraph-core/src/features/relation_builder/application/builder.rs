//! Relation builder core: endpoint lookup, per-entity dispatch and the
//! rules every ID shares
//!
//! Only obtainable from a finished [`NodeBuilder`](crate::features::node_builder::NodeBuilder),
//! and never creates nodes: an endpoint that does not exist means the node
//! builder skipped it, so the relation is logged and dropped.

use tracing::{debug, trace, warn};

use crate::errors::Result;
use crate::features::builder_map::{BuildTags, BuilderMap};
use crate::features::node_builder::BuildStats;
use crate::features::node_registry::{
    ComponentId, Graph, OperationId, OperationKey, RelationFlags, RelationSource,
};
use crate::features::scene_db::SceneDatabase;
use crate::shared::models::{EntityId, IdType, NodeType, OpCode};

/// Components fed by the parameters exit of the same ID
const PARAMETER_CONSUMERS: &[NodeType] = &[
    NodeType::Transform,
    NodeType::Geometry,
    NodeType::Shading,
    NodeType::Audio,
    NodeType::Sequencer,
    NodeType::GenericDatablock,
    NodeType::NTreeOutput,
    NodeType::LayerCollections,
    NodeType::Cache,
];

/// Adds relations between the operations created by the node builder
pub struct RelationBuilder<'a> {
    pub(super) db: &'a dyn SceneDatabase,
    pub(super) graph: &'a mut Graph,
    built_map: BuilderMap,
    node_stats: BuildStats,
    relations_added: usize,
}

impl<'a> RelationBuilder<'a> {
    pub(crate) fn new(db: &'a dyn SceneDatabase, graph: &'a mut Graph, node_stats: BuildStats) -> Self {
        Self {
            db,
            graph,
            built_map: BuilderMap::new(),
            node_stats,
            relations_added: 0,
        }
    }

    pub fn graph(&self) -> &Graph {
        &*self.graph
    }

    /// Counters of the node building pass this builder came from
    pub fn node_stats(&self) -> &BuildStats {
        &self.node_stats
    }

    /// Relations added by this pass, duplicates rejected by
    /// `CHECK_BEFORE_ADD` excluded
    pub fn relations_added(&self) -> usize {
        self.relations_added
    }

    pub fn finish(self) -> BuildStats {
        self.node_stats
    }

    /// Relations of every ID node in the graph, in node creation order
    pub fn build_relations(&mut self) -> Result<()> {
        let ids: Vec<(EntityId, IdType)> = self
            .graph
            .id_nodes()
            .iter()
            .map(|node| (node.entity, node.id_type))
            .collect();
        for (entity, id_type) in ids {
            self.build_id(entity, id_type)?;
        }
        debug!(relations = self.relations_added, "relations built");
        Ok(())
    }

    /// Relations of one entity; the builder map makes repeated calls free
    pub fn build_id(&mut self, entity: EntityId, id_type: IdType) -> Result<()> {
        if self.built_map.check_is_built_and_tag(entity, BuildTags::COMPLETE) {
            return Ok(());
        }
        self.build_component_chains(entity)?;
        self.build_copy_on_write_relations(entity)?;
        self.build_animdata(entity)?;
        self.build_parameters(entity)?;

        match id_type {
            IdType::Scene => self.build_scene(entity)?,
            IdType::Object => self.build_object(entity)?,
            IdType::Collection => self.build_collection(entity)?,
            IdType::NodeTree => self.build_nodetree(entity)?,
            IdType::Mesh | IdType::Curve => self.build_geometry_datablock(entity)?,
            IdType::Camera => self.build_camera(entity)?,
            IdType::Material | IdType::World | IdType::Light => self.build_shading(entity)?,
            IdType::Texture => self.build_texture(entity)?,
            IdType::Speaker => self.build_speaker(entity)?,
            IdType::Mask => self.build_time_dependent(entity, NodeType::Animation, OpCode::MaskAnimation)?,
            IdType::MovieClip => self.build_time_dependent(entity, NodeType::Parameters, OpCode::MovieClipEval)?,
            IdType::CacheFile => self.build_time_dependent(entity, NodeType::Cache, OpCode::FileCacheUpdate)?,
            IdType::Action
            | IdType::Sound
            | IdType::Image
            | IdType::VFont
            | IdType::Text
            | IdType::Library
            | IdType::Brush
            | IdType::Palette => {}
        }
        Ok(())
    }

    // ============================================================
    // Endpoint lookup
    // ============================================================

    pub(super) fn component(&self, entity: EntityId, node_type: NodeType) -> Option<ComponentId> {
        let id_node = self.graph.find_id_node(entity)?;
        self.graph.find_component(id_node, node_type, "")
    }

    pub(super) fn entry(&self, entity: EntityId, node_type: NodeType) -> Option<OperationId> {
        let component = self.component(entity, node_type)?;
        self.graph.component(component).entry_operation()
    }

    pub(super) fn exit(&self, entity: EntityId, node_type: NodeType) -> Option<OperationId> {
        let component = self.component(entity, node_type)?;
        self.graph.component(component).exit_operation()
    }

    pub(super) fn operation(&self, entity: EntityId, node_type: NodeType, opcode: OpCode) -> Option<OperationId> {
        self.graph
            .find_operation_node(entity, node_type, "", &OperationKey::new(opcode))
    }

    /// The operation other entities depend on when they reference `entity`
    pub(super) fn output(&self, entity: EntityId) -> Option<OperationId> {
        let id_type = self.graph.id_node_for(entity)?.id_type;
        let node_type = match id_type {
            IdType::Object => NodeType::Transform,
            IdType::Material | IdType::World | IdType::Light => NodeType::Shading,
            IdType::Texture | IdType::Image | IdType::VFont => NodeType::GenericDatablock,
            IdType::NodeTree => NodeType::NTreeOutput,
            IdType::Sound | IdType::Speaker => NodeType::Audio,
            IdType::Collection | IdType::Mesh | IdType::Curve => NodeType::Geometry,
            _ => NodeType::Parameters,
        };
        self.exit(entity, node_type)
            .or_else(|| self.exit(entity, NodeType::Parameters))
    }

    // ============================================================
    // Adding relations
    // ============================================================

    /// Relation whose endpoints the node builder guarantees
    pub(super) fn add_relation(
        &mut self,
        from: Option<OperationId>,
        to: Option<OperationId>,
        description: &str,
    ) -> Result<()> {
        self.add_relation_with_flags(from, to, description, RelationFlags::NONE)
    }

    pub(super) fn add_relation_with_flags(
        &mut self,
        from: Option<OperationId>,
        to: Option<OperationId>,
        description: &str,
        flags: RelationFlags,
    ) -> Result<()> {
        match (from, to) {
            (Some(from), Some(to)) => self.link(RelationSource::Operation(from), to, description, flags),
            _ => {
                warn!(
                    relation = description,
                    has_from = from.is_some(),
                    has_to = to.is_some(),
                    "relation endpoint was never built, skipping"
                );
                Ok(())
            }
        }
    }

    /// Relation between optional parts; silently nothing when either side is absent
    pub(super) fn add_relation_if_exists(
        &mut self,
        from: Option<OperationId>,
        to: Option<OperationId>,
        description: &str,
    ) -> Result<()> {
        if let (Some(from), Some(to)) = (from, to) {
            self.link(RelationSource::Operation(from), to, description, RelationFlags::NONE)?;
        }
        Ok(())
    }

    pub(super) fn add_time_relation(&mut self, to: Option<OperationId>, description: &str) -> Result<()> {
        match (self.graph.time_source().is_some(), to) {
            (true, Some(to)) => self.link(RelationSource::TimeSource, to, description, RelationFlags::NONE),
            (has_time, _) => {
                warn!(relation = description, has_time, "time relation endpoint missing, skipping");
                Ok(())
            }
        }
    }

    fn link(&mut self, from: RelationSource, to: OperationId, description: &str, flags: RelationFlags) -> Result<()> {
        if from == RelationSource::Operation(to) {
            trace!(relation = description, operation = %to, "skipping self relation");
            return Ok(());
        }
        let before = self.graph.relations().len();
        self.graph
            .add_relation(from, to, description, flags | RelationFlags::CHECK_BEFORE_ADD)?;
        if self.graph.relations().len() > before {
            self.relations_added += 1;
        }
        Ok(())
    }

    // ============================================================
    // Rules shared by every ID
    // ============================================================

    /// Order inside components with explicit entry and exit
    ///
    /// Transform is a strict chain in creation order; elsewhere every middle
    /// operation sits between entry and exit.
    fn build_component_chains(&mut self, entity: EntityId) -> Result<()> {
        let id_node = match self.graph.find_id_node(entity) {
            Some(id_node) => id_node,
            None => return Ok(()),
        };
        let chains: Vec<(NodeType, OperationId, OperationId, Vec<OperationId>)> = self
            .graph
            .id_node(id_node)
            .components()
            .iter()
            .filter(|c| c.has_explicit_entry() && c.has_explicit_exit())
            .filter_map(|c| {
                let entry = c.entry_operation()?;
                let exit = c.exit_operation()?;
                let middle = c
                    .operations()
                    .iter()
                    .copied()
                    .filter(|op| *op != entry && *op != exit)
                    .collect();
                Some((c.node_type(), entry, exit, middle))
            })
            .collect();

        for (node_type, entry, exit, middle) in chains {
            if node_type == NodeType::Transform {
                let mut previous = entry;
                for op in middle {
                    self.add_relation(Some(previous), Some(op), "Transform chain")?;
                    previous = op;
                }
                self.add_relation(Some(previous), Some(exit), "Transform chain")?;
            } else if middle.is_empty() {
                self.add_relation(Some(entry), Some(exit), "Component entry -> exit")?;
            } else {
                for op in middle {
                    self.add_relation(Some(entry), Some(op), "Component entry")?;
                    self.add_relation(Some(op), Some(exit), "Component exit")?;
                }
            }
        }
        Ok(())
    }

    /// Copy-on-write runs before any other component of the same ID
    fn build_copy_on_write_relations(&mut self, entity: EntityId) -> Result<()> {
        let cow = match self.operation(entity, NodeType::CopyOnWrite, OpCode::CopyOnWrite) {
            Some(cow) => cow,
            None => return Ok(()),
        };
        let id_node = match self.graph.find_id_node(entity) {
            Some(id_node) => id_node,
            None => return Ok(()),
        };
        let targets: Vec<OperationId> = self
            .graph
            .id_node(id_node)
            .components()
            .iter()
            .filter(|c| !matches!(c.node_type(), NodeType::CopyOnWrite | NodeType::Visibility))
            .flat_map(|c| match c.entry_operation() {
                Some(entry) => vec![entry],
                None => c.operations().to_vec(),
            })
            .collect();
        for target in targets {
            self.add_relation(Some(cow), Some(target), "Copy-on-Write Dependency")?;
        }
        Ok(())
    }

    /// Time source, actions and drivers
    fn build_animdata(&mut self, entity: EntityId) -> Result<()> {
        let db = self.db;
        let anim_data = match db.anim_data(entity) {
            Some(anim_data) => anim_data,
            None => return Ok(()),
        };
        let animation_entry = self.entry(entity, NodeType::Animation);
        let animation_exit = self.exit(entity, NodeType::Animation);

        // Entities reached only for their parameters never got an animation component
        if anim_data.has_animation() && animation_entry.is_some() {
            self.add_time_relation(animation_entry, "TimeSrc -> Animation")?;
            let actions = anim_data.action.iter().chain(anim_data.nla_strips.iter());
            for action in actions {
                let action_eval = self.operation(*action, NodeType::Animation, OpCode::AnimationEval);
                self.add_relation_if_exists(action_eval, animation_entry, "Action -> Animation")?;
            }
            let parameters_entry = self.entry(entity, NodeType::Parameters);
            self.add_relation(animation_exit, parameters_entry, "Animation -> Parameters")?;
            if self.graph.id_node_for(entity).map(|n| n.id_type) == Some(IdType::Object) {
                let transform_entry = self.entry(entity, NodeType::Transform);
                self.add_relation(animation_exit, transform_entry, "Animation -> Transform")?;
            }
        }

        for driver in &anim_data.drivers {
            let key = OperationKey::named(OpCode::Driver, driver.rna_path.as_str(), driver.array_index);
            let driver_op = self
                .graph
                .find_operation_node(entity, NodeType::Parameters, "", &key);
            self.add_relation_if_exists(animation_exit, driver_op, "Animation -> Driver")?;
            for variable in &driver.variables {
                for target in &variable.targets {
                    if *target == entity {
                        continue;
                    }
                    let target_output = match self.graph.id_node_for(*target).map(|n| n.id_type) {
                        Some(IdType::Object) => self.exit(*target, NodeType::Transform),
                        Some(_) => self.exit(*target, NodeType::Parameters),
                        None => None,
                    };
                    self.add_relation_if_exists(target_output, driver_op, "Driver Variable -> Driver")?;
                }
            }
        }
        Ok(())
    }

    /// Parameters feed every evaluation component of the same ID
    fn build_parameters(&mut self, entity: EntityId) -> Result<()> {
        let parameters_exit = match self.exit(entity, NodeType::Parameters) {
            Some(exit) => exit,
            None => return Ok(()),
        };
        for node_type in PARAMETER_CONSUMERS {
            if let Some(entry) = self.entry(entity, *node_type) {
                self.add_relation(Some(parameters_exit), Some(entry), "Parameters -> Component")?;
            }
        }
        Ok(())
    }

    /// Leaf IDs whose only evaluation follows the frame
    fn build_time_dependent(&mut self, entity: EntityId, node_type: NodeType, opcode: OpCode) -> Result<()> {
        let op = self.operation(entity, node_type, opcode);
        self.add_time_relation(op, "TimeSrc -> Datablock")
    }
}
