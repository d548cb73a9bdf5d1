//! Datablocks without transform: node trees, shading, images, audio and
//! the small leaf types

use super::builder::NodeBuilder;
use crate::errors::Result;
use crate::features::builder_map::BuildTags;
use crate::features::node_builder::domain::BuildStep;
use crate::features::scene_db::{Entity, EntityData, TreeNode};
use crate::shared::models::{EntityId, IdType, LinkedState, NodeType, OpCode};

impl<'a> NodeBuilder<'a> {
    /// Whole-entity guard shared by every builder in this file
    ///
    /// Returns the entity when this call has to do the expansion.
    fn begin_datablock(&mut self, id: EntityId, step: BuildStep) -> Result<Option<&'a Entity>> {
        if self.check_is_built_and_tag(id, BuildTags::COMPLETE) {
            return Ok(None);
        }
        let entity = match self.entity(id) {
            Some(entity) => entity,
            None => return Ok(None),
        };
        self.record(id, step);
        self.add_id_node(id)?;
        Ok(Some(entity))
    }

    // ============================================================
    // Node trees
    // ============================================================

    /// Node tree parameters, output and every entity its nodes reference
    pub fn build_nodetree(&mut self, tree: EntityId) -> Result<()> {
        let entity = match self.begin_datablock(tree, BuildStep::NodeTree)? {
            Some(entity) => entity,
            None => return Ok(()),
        };
        self.build_parameters(tree)?;
        self.build_idproperties(&entity.properties)?;
        self.build_animdata_nodes(tree)?;
        self.add_op(tree, NodeType::NTreeOutput, OpCode::NTreeOutput)?;

        let nodes: &'a [TreeNode] = match &entity.data {
            EntityData::NodeTree(data) => data.nodes.as_slice(),
            _ => &[],
        };
        let db = self.db;
        for node in nodes {
            self.build_idproperties(&node.properties)?;
            let id = match node.id {
                Some(id) => id,
                None => continue,
            };
            match db.id_type(id) {
                Some(IdType::Object) => {
                    self.build_object(None, id, LinkedState::Indirectly, true)?;
                }
                Some(IdType::Scene) => {
                    self.build_scene_parameters(id)?;
                    // Defocus nodes read the camera of the referenced scene
                    if let Some(camera) = db.scene(id).and_then(|s| s.camera) {
                        self.build_object(None, camera, LinkedState::Indirectly, true)?;
                    }
                }
                Some(IdType::Text) | None => {}
                Some(_) => self.build_id(id)?,
            }
        }
        Ok(())
    }

    // ============================================================
    // Shading
    // ============================================================

    pub fn build_materials(&mut self, materials: &[EntityId]) -> Result<()> {
        for material in materials {
            self.build_material(*material)?;
        }
        Ok(())
    }

    pub fn build_material(&mut self, material: EntityId) -> Result<()> {
        let entity = match self.begin_datablock(material, BuildStep::Material)? {
            Some(entity) => entity,
            None => return Ok(()),
        };
        self.add_op(material, NodeType::Shading, OpCode::MaterialUpdate)?;
        self.build_idproperties(&entity.properties)?;
        self.build_animdata_nodes(material)?;
        self.build_parameters(material)?;
        if let EntityData::Material(shading) = &entity.data {
            if let Some(tree) = shading.node_tree {
                self.build_nodetree(tree)?;
            }
        }
        Ok(())
    }

    pub fn build_world(&mut self, world: EntityId) -> Result<()> {
        let entity = match self.begin_datablock(world, BuildStep::World)? {
            Some(entity) => entity,
            None => return Ok(()),
        };
        self.build_idproperties(&entity.properties)?;
        self.build_animdata_nodes(world)?;
        self.build_parameters(world)?;
        self.add_op(world, NodeType::Shading, OpCode::WorldUpdate)?;
        if let EntityData::World(shading) = &entity.data {
            if let Some(tree) = shading.node_tree {
                self.build_nodetree(tree)?;
            }
        }
        Ok(())
    }

    pub fn build_light(&mut self, light: EntityId) -> Result<()> {
        let entity = match self.begin_datablock(light, BuildStep::Light)? {
            Some(entity) => entity,
            None => return Ok(()),
        };
        self.build_parameters(light)?;
        self.build_idproperties(&entity.properties)?;
        self.build_animdata_nodes(light)?;
        if let EntityData::Light(shading) = &entity.data {
            if let Some(tree) = shading.node_tree {
                self.build_nodetree(tree)?;
            }
        }
        self.add_op(light, NodeType::Shading, OpCode::LightUpdate)?;
        Ok(())
    }

    pub fn build_texture(&mut self, texture: EntityId) -> Result<()> {
        let entity = match self.begin_datablock(texture, BuildStep::Texture)? {
            Some(entity) => entity,
            None => return Ok(()),
        };
        self.build_idproperties(&entity.properties)?;
        self.build_animdata_nodes(texture)?;
        self.build_parameters(texture)?;
        if let EntityData::Texture(data) = &entity.data {
            if let Some(tree) = data.node_tree {
                self.build_nodetree(tree)?;
            }
            if let Some(image) = data.image {
                self.build_image(image)?;
            }
        }
        self.add_op(texture, NodeType::GenericDatablock, OpCode::GenericDatablockUpdate)?;
        Ok(())
    }

    pub fn build_image(&mut self, image: EntityId) -> Result<()> {
        let entity = match self.begin_datablock(image, BuildStep::Image)? {
            Some(entity) => entity,
            None => return Ok(()),
        };
        self.build_parameters(image)?;
        self.build_idproperties(&entity.properties)?;
        self.add_op(image, NodeType::GenericDatablock, OpCode::GenericDatablockUpdate)?;
        Ok(())
    }

    pub fn build_vfont(&mut self, vfont: EntityId) -> Result<()> {
        let entity = match self.begin_datablock(vfont, BuildStep::VFont)? {
            Some(entity) => entity,
            None => return Ok(()),
        };
        self.build_parameters(vfont)?;
        self.build_idproperties(&entity.properties)?;
        self.add_op(vfont, NodeType::GenericDatablock, OpCode::GenericDatablockUpdate)?;
        Ok(())
    }

    // ============================================================
    // Object data
    // ============================================================

    pub fn build_camera(&mut self, camera: EntityId) -> Result<()> {
        let entity = match self.begin_datablock(camera, BuildStep::Camera)? {
            Some(entity) => entity,
            None => return Ok(()),
        };
        self.build_idproperties(&entity.properties)?;
        self.build_animdata_nodes(camera)?;
        self.build_parameters(camera)?;
        if let EntityData::Camera(data) = &entity.data {
            if let Some(focus) = data.dof_object {
                self.build_object(None, focus, LinkedState::Indirectly, false)?;
            }
        }
        Ok(())
    }

    pub fn build_speaker(&mut self, speaker: EntityId) -> Result<()> {
        let entity = match self.begin_datablock(speaker, BuildStep::Speaker)? {
            Some(entity) => entity,
            None => return Ok(()),
        };
        self.build_idproperties(&entity.properties)?;
        self.add_op(speaker, NodeType::Audio, OpCode::SpeakerEval)?;
        self.build_animdata_nodes(speaker)?;
        self.build_parameters(speaker)?;
        if let EntityData::Speaker(data) = &entity.data {
            if let Some(sound) = data.sound {
                self.build_sound(sound)?;
            }
        }
        Ok(())
    }

    pub fn build_sound(&mut self, sound: EntityId) -> Result<()> {
        let entity = match self.begin_datablock(sound, BuildStep::Sound)? {
            Some(entity) => entity,
            None => return Ok(()),
        };
        self.build_idproperties(&entity.properties)?;
        self.add_op(sound, NodeType::Audio, OpCode::SoundEval)?;
        self.build_animdata_nodes(sound)?;
        self.build_parameters(sound)?;
        Ok(())
    }

    // ============================================================
    // Leaf datablocks
    // ============================================================

    pub fn build_mask(&mut self, mask: EntityId) -> Result<()> {
        let entity = match self.begin_datablock(mask, BuildStep::Mask)? {
            Some(entity) => entity,
            None => return Ok(()),
        };
        self.build_idproperties(&entity.properties)?;
        self.build_animdata_nodes(mask)?;
        self.build_parameters(mask)?;
        self.add_op(mask, NodeType::Animation, OpCode::MaskAnimation)?;
        self.add_op(mask, NodeType::Parameters, OpCode::MaskEval)?;
        Ok(())
    }

    pub fn build_movieclip(&mut self, clip: EntityId) -> Result<()> {
        let entity = match self.begin_datablock(clip, BuildStep::MovieClip)? {
            Some(entity) => entity,
            None => return Ok(()),
        };
        self.build_idproperties(&entity.properties)?;
        self.build_animdata_nodes(clip)?;
        self.build_parameters(clip)?;
        self.add_op(clip, NodeType::Parameters, OpCode::MovieClipEval)?;
        Ok(())
    }

    pub fn build_cachefile(&mut self, cache_file: EntityId) -> Result<()> {
        let entity = match self.begin_datablock(cache_file, BuildStep::CacheFile)? {
            Some(entity) => entity,
            None => return Ok(()),
        };
        self.build_idproperties(&entity.properties)?;
        self.build_animdata_nodes(cache_file)?;
        self.build_parameters(cache_file)?;
        self.add_op(cache_file, NodeType::Cache, OpCode::FileCacheUpdate)?;
        Ok(())
    }
}
