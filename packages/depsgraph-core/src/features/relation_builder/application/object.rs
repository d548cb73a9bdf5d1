//! Object, collection and object-data relations

use super::builder::RelationBuilder;
use crate::errors::Result;
use crate::features::node_registry::RelationFlags;
use crate::features::scene_db::EntityData;
use crate::shared::models::{EntityId, IdType, NodeType, OpCode};

impl<'a> RelationBuilder<'a> {
    pub(super) fn build_object(&mut self, object: EntityId) -> Result<()> {
        let db = self.db;
        let data = match db.object(object) {
            Some(data) => data,
            None => return Ok(()),
        };

        let transform_exit = self.exit(object, NodeType::Transform);
        let geometry_entry = self.entry(object, NodeType::Geometry);

        if let Some(parent) = data.parent {
            let parent_transform = self.exit(parent, NodeType::Transform);
            let transform_parent = self.operation(object, NodeType::Transform, OpCode::TransformParent);
            self.add_relation(parent_transform, transform_parent, "Parent -> Child Transform")?;
        }

        let constraints = self.operation(object, NodeType::Transform, OpCode::TransformConstraints);
        for constraint in &data.constraints {
            for target in &constraint.targets {
                if *target == object {
                    continue;
                }
                let target_output = self.output(*target);
                self.add_relation_if_exists(target_output, constraints, "Constraint Target -> Constraints")?;
            }
        }

        for modifier in &data.modifiers {
            for id in &modifier.ids {
                if *id == object {
                    continue;
                }
                let id_output = self.output(*id);
                self.add_relation_if_exists(id_output, geometry_entry, "Modifier Dependency -> Geometry")?;
            }
        }

        if let Some(obdata) = data.data {
            self.build_object_data(object, obdata)?;
        }

        // Object material slots; datablock slots are linked by the datablock itself
        let materials_target = geometry_entry.or_else(|| self.entry(object, NodeType::Parameters));
        for material in &data.materials {
            let shading = self.exit(*material, NodeType::Shading);
            self.add_relation_if_exists(shading, materials_target, "Material -> Object")?;
        }

        if let Some(collection) = data.instance_collection {
            let collection_done = self.exit(collection, NodeType::Geometry);
            let dupli = self.operation(object, NodeType::Dupli, OpCode::Dupli);
            self.add_relation_if_exists(collection_done, dupli, "Instanced Collection -> Dupli")?;
        }

        let sync = self.operation(object, NodeType::Synchronization, OpCode::SynchronizeToOriginal);
        self.add_relation_with_flags(
            transform_exit,
            sync,
            "Transform -> Synchronize to Original",
            RelationFlags::FLUSH_USER_EDIT_ONLY,
        )?;
        let geometry_exit = self.exit(object, NodeType::Geometry);
        if geometry_exit.is_some() {
            self.add_relation_with_flags(
                geometry_exit,
                sync,
                "Geometry -> Synchronize to Original",
                RelationFlags::FLUSH_USER_EDIT_ONLY,
            )?;
        }
        let from_layer_exit = self.exit(object, NodeType::ObjectFromLayer);
        self.add_relation(from_layer_exit, sync, "Object Flags -> Synchronize to Original")?;
        Ok(())
    }

    fn build_object_data(&mut self, object: EntityId, obdata: EntityId) -> Result<()> {
        let obdata_type = match self.graph.id_node_for(obdata) {
            Some(node) => node.id_type,
            None => return Ok(()),
        };
        match obdata_type {
            IdType::Mesh | IdType::Curve => {
                let datablock_geometry = self.exit(obdata, NodeType::Geometry);
                let geometry_init = self.entry(object, NodeType::Geometry);
                self.add_relation(datablock_geometry, geometry_init, "Object Data -> Geometry")?;
            }
            IdType::Camera | IdType::Light => {
                let data_parameters = self.exit(obdata, NodeType::Parameters);
                let object_parameters = self.entry(object, NodeType::Parameters);
                self.add_relation(data_parameters, object_parameters, "Object Data -> Parameters")?;
            }
            IdType::Speaker => {
                let data_parameters = self.exit(obdata, NodeType::Parameters);
                let object_parameters = self.entry(object, NodeType::Parameters);
                self.add_relation(data_parameters, object_parameters, "Object Data -> Parameters")?;
                let data_audio = self.exit(obdata, NodeType::Audio);
                let object_audio = self.operation(object, NodeType::Audio, OpCode::SpeakerEval);
                self.add_relation(data_audio, object_audio, "Speaker Data -> Speaker")?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Collection geometry is done once its objects and children are
    pub(super) fn build_collection(&mut self, collection: EntityId) -> Result<()> {
        let db = self.db;
        let data = match db.collection(collection) {
            Some(data) => data,
            None => return Ok(()),
        };
        let done = self.operation(collection, NodeType::Geometry, OpCode::GeometryEvalDone);
        for object in &data.objects {
            let transform = self.exit(*object, NodeType::Transform);
            self.add_relation_if_exists(transform, done, "Collection Object -> Collection")?;
        }
        for child in &data.children {
            if *child == collection {
                continue;
            }
            let child_done = self.operation(*child, NodeType::Geometry, OpCode::GeometryEvalDone);
            self.add_relation_if_exists(child_done, done, "Child Collection -> Collection")?;
        }
        Ok(())
    }

    pub(super) fn build_geometry_datablock(&mut self, obdata: EntityId) -> Result<()> {
        let db = self.db;
        let materials = match db.get(obdata).map(|e| &e.data) {
            Some(EntityData::Mesh(geometry)) | Some(EntityData::Curve(geometry)) => &geometry.materials,
            _ => return Ok(()),
        };
        let geometry_entry = self.entry(obdata, NodeType::Geometry);
        for material in materials {
            let shading = self.exit(*material, NodeType::Shading);
            self.add_relation_if_exists(shading, geometry_entry, "Material -> Geometry")?;
        }
        Ok(())
    }

    pub(super) fn build_camera(&mut self, camera: EntityId) -> Result<()> {
        let db = self.db;
        let focus = match db.get(camera).map(|e| &e.data) {
            Some(EntityData::Camera(data)) => data.dof_object,
            _ => None,
        };
        if let Some(focus) = focus {
            let focus_transform = self.exit(focus, NodeType::Transform);
            let parameters = self.entry(camera, NodeType::Parameters);
            self.add_relation_if_exists(focus_transform, parameters, "Camera DOF")?;
        }
        Ok(())
    }

    pub(super) fn build_speaker(&mut self, speaker: EntityId) -> Result<()> {
        let db = self.db;
        let sound = match db.get(speaker).map(|e| &e.data) {
            Some(EntityData::Speaker(data)) => data.sound,
            _ => None,
        };
        if let Some(sound) = sound {
            let sound_eval = self.exit(sound, NodeType::Audio);
            let speaker_eval = self.operation(speaker, NodeType::Audio, OpCode::SpeakerEval);
            self.add_relation_if_exists(sound_eval, speaker_eval, "Sound -> Speaker")?;
        }
        Ok(())
    }
}
