//! Collections and objects

use super::builder::NodeBuilder;
use crate::errors::Result;
use crate::features::builder_map::BuildTags;
use crate::features::node_builder::domain::BuildStep;
use crate::features::node_registry::OperationFlags;
use crate::features::scene_db::{EntityData, LayerCollection, ObjectData};
use crate::shared::models::{EntityId, IdType, LinkedState, NodeType, OpCode};

impl<'a> NodeBuilder<'a> {
    // ============================================================
    // Collections
    // ============================================================

    /// Collection node, and unless built from a layer collection, its
    /// objects and child collections
    ///
    /// A collection already built is visited again when it became visible,
    /// or when it was first built from a layer collection and is now asked
    /// for its contents.
    pub fn build_collection(
        &mut self,
        from_layer: Option<&LayerCollection>,
        collection: EntityId,
    ) -> Result<()> {
        let db = self.db;
        let (entity, data) = match db.get(collection) {
            Some(entity) => match &entity.data {
                EntityData::Collection(data) => (entity, data),
                _ => return Ok(()),
            },
            None => return Ok(()),
        };
        let is_visible = !data.is_hidden(self.graph.mode()) && self.ctx.is_parent_collection_visible;

        let id_node = if self.check_is_built_and_tag(collection, BuildTags::COMPLETE) {
            let id_node = match self.graph.find_id_node(collection) {
                Some(id_node) => id_node,
                None => return Ok(()),
            };
            let node = self.graph.id_node(id_node);
            let became_visible =
                is_visible && !node.is_directly_visible && node.is_collection_fully_expanded;
            let needs_contents = from_layer.is_none() && !node.is_collection_fully_expanded;
            if !became_visible && !needs_contents {
                return Ok(());
            }
            id_node
        } else {
            self.record(collection, BuildStep::Collection);
            let id_node = self.add_id_node(collection)?;
            self.graph.id_node_mut(id_node).is_directly_visible = is_visible;
            self.build_idproperties(&entity.properties)?;
            self.add_op(collection, NodeType::Geometry, OpCode::GeometryEvalDone)?;
            id_node
        };

        // The view layer walks nested layer collections itself
        if from_layer.is_some() {
            return Ok(());
        }

        // Marked before recursing: a collection nested in itself stops here
        {
            let node = self.graph.id_node_mut(id_node);
            node.is_collection_fully_expanded = true;
            node.is_directly_visible |= is_visible;
        }

        let saved = self.ctx.enter_collection(collection, is_visible);
        for object in &data.objects {
            self.build_object(None, *object, LinkedState::Indirectly, is_visible)?;
        }
        for child in &data.children {
            self.build_collection(None, *child)?;
        }
        self.ctx.restore(saved);
        Ok(())
    }

    // ============================================================
    // Objects
    // ============================================================

    /// Object node with transform, parent, constraints, modifiers, data,
    /// animation and instanced collection
    ///
    /// Re-entry keeps the strongest linked state and accumulates visibility
    /// and base membership.
    pub fn build_object(
        &mut self,
        base_index: Option<usize>,
        object: EntityId,
        linked_state: LinkedState,
        is_visible: bool,
    ) -> Result<()> {
        let db = self.db;
        let (entity, data) = match db.get(object) {
            Some(entity) => match &entity.data {
                EntityData::Object(data) => (entity, data),
                _ => return Ok(()),
            },
            None => return Ok(()),
        };

        if self.check_is_built_and_tag(object, BuildTags::COMPLETE) {
            if let Some(id_node) = self.graph.find_id_node(object) {
                if self.graph.id_node(id_node).linked_state() == LinkedState::Indirectly {
                    self.build_object_flags(base_index, object)?;
                }
                let node = self.graph.id_node_mut(id_node);
                node.upgrade_linked_state(linked_state);
                node.is_directly_visible |= is_visible;
                node.has_base |= base_index.is_some();
            }
            // Objects reached through the instanced collection have no other
            // path to this one; let the collection decide whether to revisit.
            return self.build_object_instance_collection(data, is_visible);
        }
        self.record(object, BuildStep::Object);

        let id_node = self.add_id_node(object)?;
        let is_scene_camera = self
            .ctx
            .scene
            .and_then(|scene| db.scene(scene))
            .map_or(false, |scene| scene.camera == Some(object));
        {
            let node = self.graph.id_node_mut(id_node);
            node.upgrade_linked_state(linked_state);
            node.is_directly_visible |= is_scene_camera || is_visible;
            node.has_base |= base_index.is_some();
        }

        self.build_object_from_layer(base_index, object)?;
        self.build_object_transform(object, data)?;

        if let Some(parent) = data.parent {
            self.build_object(None, parent, LinkedState::Indirectly, is_visible)?;
        }
        for modifier in &data.modifiers {
            for id in &modifier.ids {
                self.build_object_dependency(*id, is_visible)?;
            }
        }
        for constraint in &data.constraints {
            for target in &constraint.targets {
                self.build_object_dependency(*target, is_visible)?;
            }
        }

        self.build_object_data(object, data)?;
        self.build_materials(&data.materials)?;
        self.build_parameters(object)?;
        self.build_idproperties(&entity.properties)?;
        self.build_animdata_nodes(object)?;

        if data.instance_collection.is_some() {
            self.build_object_instance_collection(data, is_visible)?;
            let dupli = self.add_op(object, NodeType::Dupli, OpCode::Dupli)?;
            self.graph
                .operation_mut(dupli)
                .flags
                .insert(OperationFlags::PINNED);
        }

        self.add_op(object, NodeType::Synchronization, OpCode::SynchronizeToOriginal)?;
        Ok(())
    }

    /// Modifier and constraint references: objects inherit the owner's visibility
    fn build_object_dependency(&mut self, id: EntityId, is_visible: bool) -> Result<()> {
        if self.db.id_type(id) == Some(IdType::Object) {
            self.build_object(None, id, LinkedState::Indirectly, is_visible)
        } else {
            self.build_id(id)
        }
    }

    fn build_object_from_layer(&mut self, base_index: Option<usize>, object: EntityId) -> Result<()> {
        self.add_entry_op(object, NodeType::ObjectFromLayer, OpCode::ObjectFromLayerEntry)?;
        self.add_exit_op(object, NodeType::ObjectFromLayer, OpCode::ObjectFromLayerExit)?;
        self.build_object_flags(base_index, object)
    }

    /// Base flags only exist for objects reached through a view layer base
    fn build_object_flags(&mut self, base_index: Option<usize>, object: EntityId) -> Result<()> {
        if base_index.is_none() {
            return Ok(());
        }
        self.add_op(object, NodeType::ObjectFromLayer, OpCode::ObjectBaseFlags)?;
        Ok(())
    }

    fn build_object_transform(&mut self, object: EntityId, data: &ObjectData) -> Result<()> {
        self.add_entry_op(object, NodeType::Transform, OpCode::TransformInit)?;
        self.add_op(object, NodeType::Transform, OpCode::TransformLocal)?;
        if data.parent.is_some() {
            self.add_op(object, NodeType::Transform, OpCode::TransformParent)?;
        }
        if !data.constraints.is_empty() {
            self.add_op(object, NodeType::Transform, OpCode::TransformConstraints)?;
        }
        self.add_exit_op(object, NodeType::Transform, OpCode::TransformFinal)?;
        Ok(())
    }

    fn build_object_instance_collection(&mut self, data: &ObjectData, is_visible: bool) -> Result<()> {
        let collection = match data.instance_collection {
            Some(collection) => collection,
            None => return Ok(()),
        };
        let saved_visibility = self.ctx.is_parent_collection_visible;
        self.ctx.is_parent_collection_visible = is_visible;
        let result = self.build_collection(None, collection);
        self.ctx.is_parent_collection_visible = saved_visibility;
        result
    }

    // ============================================================
    // Object data
    // ============================================================

    fn build_object_data(&mut self, object: EntityId, data: &ObjectData) -> Result<()> {
        let obdata = match data.data {
            Some(obdata) => obdata,
            None => return Ok(()),
        };
        match self.db.id_type(obdata) {
            Some(IdType::Mesh) | Some(IdType::Curve) => {
                self.build_object_data_geometry(object, obdata)?;
            }
            Some(IdType::Camera) => self.build_camera(obdata)?,
            Some(IdType::Light) => self.build_light(obdata)?,
            Some(IdType::Speaker) => {
                self.build_speaker(obdata)?;
                self.add_op(object, NodeType::Audio, OpCode::SpeakerEval)?;
            }
            Some(_) => self.build_id(obdata)?,
            None => {}
        }
        Ok(())
    }

    /// The object's own geometry evaluation plus its shared geometry datablock
    fn build_object_data_geometry(&mut self, object: EntityId, obdata: EntityId) -> Result<()> {
        self.add_entry_op(object, NodeType::Geometry, OpCode::GeometryEvalInit)?;
        self.add_op(object, NodeType::Geometry, OpCode::GeometryEval)?;
        self.add_exit_op(object, NodeType::Geometry, OpCode::GeometryEvalDone)?;
        self.build_object_data_geometry_datablock(obdata)
    }

    /// Mesh or curve datablock shared between objects
    pub fn build_object_data_geometry_datablock(&mut self, obdata: EntityId) -> Result<()> {
        if self.check_is_built_and_tag(obdata, BuildTags::COMPLETE) {
            return Ok(());
        }
        let entity = match self.entity(obdata) {
            Some(entity) => entity,
            None => return Ok(()),
        };
        let materials: &'a [EntityId] = match &entity.data {
            EntityData::Mesh(geometry) | EntityData::Curve(geometry) => &geometry.materials,
            _ => &[],
        };
        self.record(obdata, BuildStep::GeometryDatablock);
        self.add_id_node(obdata)?;
        self.build_idproperties(&entity.properties)?;
        self.build_animdata_nodes(obdata)?;
        self.build_parameters(obdata)?;
        self.add_op(obdata, NodeType::Geometry, OpCode::GeometryEval)?;
        self.build_materials(materials)
    }
}
