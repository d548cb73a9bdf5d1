//! Traversal state carried through one build call

use crate::shared::models::EntityId;

/// Scene, view layer and collection currently being expanded
///
/// Replaces process-wide "current scene" state: every builder owns one, so
/// independent builds never observe each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
    pub scene: Option<EntityId>,
    pub view_layer: Option<String>,
    pub collection: Option<EntityId>,
    pub is_parent_collection_visible: bool,
}

impl Default for BuildContext {
    fn default() -> Self {
        Self {
            scene: None,
            view_layer: None,
            collection: None,
            is_parent_collection_visible: true,
        }
    }
}

impl BuildContext {
    /// Switch to `scene`/`view_layer`, returning the previous state for [`restore`](Self::restore)
    pub fn enter_scene(&mut self, scene: EntityId, view_layer: &str) -> BuildContext {
        let saved = self.clone();
        self.scene = Some(scene);
        self.view_layer = Some(view_layer.to_string());
        saved
    }

    /// Switch to `collection` with its visibility, returning the previous state
    pub fn enter_collection(&mut self, collection: EntityId, is_visible: bool) -> BuildContext {
        let saved = self.clone();
        self.collection = Some(collection);
        self.is_parent_collection_visible = is_visible;
        saved
    }

    pub fn restore(&mut self, saved: BuildContext) {
        *self = saved;
    }
}
