//! Read-only access to externally owned scene data

use crate::features::scene_db::domain::{
    AnimData, CollectionData, Entity, EntityData, NodeTreeData, ObjectData, SceneData,
};
use crate::shared::models::{EntityId, IdType};

/// Scene database port
///
/// The graph never mutates entity data; the database must stay unchanged for
/// the duration of one build pass.
pub trait SceneDatabase: Send + Sync {
    /// Entity behind `id`, or `None` for a dangling handle
    fn get(&self, id: EntityId) -> Option<&Entity>;

    /// All live entity handles, in creation order
    fn entity_ids(&self) -> Vec<EntityId>;

    fn id_type(&self, id: EntityId) -> Option<IdType> {
        self.get(id).map(Entity::id_type)
    }

    fn name(&self, id: EntityId) -> Option<&str> {
        self.get(id).map(|e| e.name.as_str())
    }

    fn anim_data(&self, id: EntityId) -> Option<&AnimData> {
        self.get(id).and_then(|e| e.anim_data.as_ref())
    }

    fn scene(&self, id: EntityId) -> Option<&SceneData> {
        match self.get(id).map(|e| &e.data) {
            Some(EntityData::Scene(scene)) => Some(scene),
            _ => None,
        }
    }

    fn object(&self, id: EntityId) -> Option<&ObjectData> {
        match self.get(id).map(|e| &e.data) {
            Some(EntityData::Object(object)) => Some(object),
            _ => None,
        }
    }

    fn node_tree(&self, id: EntityId) -> Option<&NodeTreeData> {
        match self.get(id).map(|e| &e.data) {
            Some(EntityData::NodeTree(tree)) => Some(tree),
            _ => None,
        }
    }

    fn collection(&self, id: EntityId) -> Option<&CollectionData> {
        match self.get(id).map(|e| &e.data) {
            Some(EntityData::Collection(collection)) => Some(collection),
            _ => None,
        }
    }

    /// Every entity of one kind, in creation order
    fn entities_of_type(&self, id_type: IdType) -> Vec<EntityId> {
        self.entity_ids()
            .into_iter()
            .filter(|id| self.id_type(*id) == Some(id_type))
            .collect()
    }
}
