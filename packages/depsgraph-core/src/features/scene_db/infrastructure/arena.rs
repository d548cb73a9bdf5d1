//! In-memory scene database
//!
//! Entities live in a slot vector; the slot index is the [`EntityId`].
//! Removed entities leave an empty slot so handles stay stable.

use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::features::scene_db::domain::{
    CollectionData, Entity, EntityData, NodeTreeData, ObjectData, SceneData,
};
use crate::features::scene_db::ports::SceneDatabase;
use crate::shared::models::EntityId;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneArena {
    entities: Vec<Option<Entity>>,
}

impl SceneArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entity and return its handle
    pub fn add(&mut self, entity: Entity) -> EntityId {
        let id = EntityId(self.entities.len() as u32);
        self.entities.push(Some(entity));
        id
    }

    pub fn add_data(&mut self, name: impl Into<String>, data: EntityData) -> EntityId {
        self.add(Entity::new(name, data))
    }

    pub fn add_scene(&mut self, name: impl Into<String>, scene: SceneData) -> EntityId {
        self.add_data(name, EntityData::Scene(scene))
    }

    pub fn add_object(&mut self, name: impl Into<String>, object: ObjectData) -> EntityId {
        self.add_data(name, EntityData::Object(object))
    }

    pub fn add_node_tree(&mut self, name: impl Into<String>, tree: NodeTreeData) -> EntityId {
        self.add_data(name, EntityData::NodeTree(tree))
    }

    pub fn add_collection(&mut self, name: impl Into<String>, collection: CollectionData) -> EntityId {
        self.add_data(name, EntityData::Collection(collection))
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id.index()).and_then(Option::as_mut)
    }

    pub fn scene_mut(&mut self, id: EntityId) -> Option<&mut SceneData> {
        match self.get_mut(id).map(|e| &mut e.data) {
            Some(EntityData::Scene(scene)) => Some(scene),
            _ => None,
        }
    }

    pub fn object_mut(&mut self, id: EntityId) -> Option<&mut ObjectData> {
        match self.get_mut(id).map(|e| &mut e.data) {
            Some(EntityData::Object(object)) => Some(object),
            _ => None,
        }
    }

    pub fn node_tree_mut(&mut self, id: EntityId) -> Option<&mut NodeTreeData> {
        match self.get_mut(id).map(|e| &mut e.data) {
            Some(EntityData::NodeTree(tree)) => Some(tree),
            _ => None,
        }
    }

    /// Remove an entity; the handle becomes dangling
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.get_mut(id.index()).and_then(Option::take)
    }

    /// Number of live entities
    pub fn len(&self) -> usize {
        self.entities.iter().filter(|e| e.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl SceneDatabase for SceneArena {
    fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id.index()).and_then(Option::as_ref)
    }

    fn entity_ids(&self) -> Vec<EntityId> {
        self.entities
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_some())
            .map(|(i, _)| EntityId(i as u32))
            .collect()
    }
}
