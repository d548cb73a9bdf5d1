//! Scene, node tree and shading relations

use super::builder::RelationBuilder;
use crate::errors::Result;
use crate::features::scene_db::EntityData;
use crate::shared::models::{EntityId, IdType, NodeType, OpCode};

impl<'a> RelationBuilder<'a> {
    pub(super) fn build_scene(&mut self, scene: EntityId) -> Result<()> {
        let db = self.db;
        let data = match db.scene(scene) {
            Some(data) => data,
            None => return Ok(()),
        };

        // Audio and sequencer follow the frame
        let audio_entry = self.entry(scene, NodeType::Audio);
        if audio_entry.is_some() {
            self.add_time_relation(audio_entry, "TimeSrc -> Audio")?;
        }
        let sequences = self.operation(scene, NodeType::Sequencer, OpCode::SequencesEval);
        if sequences.is_some() {
            self.add_time_relation(sequences, "TimeSrc -> Sequencer")?;
            if let Some(sequencer) = &data.sequencer {
                for strip in &sequencer.strips {
                    if let Some(sound) = strip.sound {
                        let sound_eval = self.exit(sound, NodeType::Audio);
                        self.add_relation_if_exists(sound_eval, sequences, "Strip Sound -> Sequencer")?;
                    }
                    if let Some(strip_scene) = strip.scene.filter(|s| *s != scene) {
                        let parameters = self.exit(strip_scene, NodeType::Parameters);
                        self.add_relation_if_exists(parameters, sequences, "Strip Scene -> Sequencer")?;
                    }
                }
            }
        }

        // Base flags are computed from the view layer
        let view_layer_eval = self.operation(scene, NodeType::LayerCollections, OpCode::ViewLayerEval);
        if view_layer_eval.is_some() {
            for view_layer in &data.view_layers {
                for base in &view_layer.bases {
                    let from_layer = self.entry(base.object, NodeType::ObjectFromLayer);
                    self.add_relation_if_exists(view_layer_eval, from_layer, "View Layer -> Object Flags")?;
                }
            }
        }
        Ok(())
    }

    /// Every entity a node references feeds the tree output
    pub(super) fn build_nodetree(&mut self, tree: EntityId) -> Result<()> {
        let db = self.db;
        let data = match db.node_tree(tree) {
            Some(data) => data,
            None => return Ok(()),
        };
        let output = self.operation(tree, NodeType::NTreeOutput, OpCode::NTreeOutput);
        for node in &data.nodes {
            let id = match node.id.filter(|id| *id != tree) {
                Some(id) => id,
                None => continue,
            };
            if self.graph.id_node_for(id).map(|n| n.id_type) == Some(IdType::Text) {
                continue;
            }
            let id_output = self.output(id);
            self.add_relation_if_exists(id_output, output, "Node Dependency -> Tree Output")?;
        }
        Ok(())
    }

    /// Material, world and light: the nested tree feeds the shading update
    pub(super) fn build_shading(&mut self, entity: EntityId) -> Result<()> {
        let db = self.db;
        let tree = match db.get(entity).map(|e| &e.data) {
            Some(EntityData::Material(shading))
            | Some(EntityData::World(shading))
            | Some(EntityData::Light(shading)) => shading.node_tree,
            _ => None,
        };
        if let Some(tree) = tree {
            let tree_output = self.operation(tree, NodeType::NTreeOutput, OpCode::NTreeOutput);
            let shading = self.entry(entity, NodeType::Shading);
            self.add_relation_if_exists(tree_output, shading, "Node Tree -> Shading")?;
        }
        Ok(())
    }

    pub(super) fn build_texture(&mut self, texture: EntityId) -> Result<()> {
        let db = self.db;
        let (tree, image) = match db.get(texture).map(|e| &e.data) {
            Some(EntityData::Texture(data)) => (data.node_tree, data.image),
            _ => return Ok(()),
        };
        let update = self.operation(texture, NodeType::GenericDatablock, OpCode::GenericDatablockUpdate);
        if let Some(tree) = tree {
            let tree_output = self.operation(tree, NodeType::NTreeOutput, OpCode::NTreeOutput);
            self.add_relation_if_exists(tree_output, update, "Node Tree -> Texture")?;
        }
        if let Some(image) = image {
            let image_update = self.operation(image, NodeType::GenericDatablock, OpCode::GenericDatablockUpdate);
            self.add_relation_if_exists(image_update, update, "Image -> Texture")?;
        }
        Ok(())
    }
}
