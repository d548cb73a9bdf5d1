//! Per-build dedup cache

use ahash::AHashMap;
use tracing::trace;

use super::tags::BuildTags;
use crate::shared::models::EntityId;

/// Records which (entity, tag) pairs were already expanded in one build pass
///
/// Created fresh for every (re)build and dropped after relation building.
#[derive(Debug, Default, Clone)]
pub struct BuilderMap {
    built: AHashMap<EntityId, BuildTags>,
}

impl BuilderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when every bit of `tags` was already recorded for `entity`
    pub fn check_is_built(&self, entity: EntityId, tags: BuildTags) -> bool {
        self.built
            .get(&entity)
            .map_or(false, |recorded| recorded.contains(tags))
    }

    /// Record `tags` for `entity`
    pub fn tag_build(&mut self, entity: EntityId, tags: BuildTags) {
        *self.built.entry(entity).or_default() |= tags;
    }

    /// First call per (entity, tags) returns `false` and records the pair;
    /// every later call returns `true` and changes nothing
    pub fn check_is_built_and_tag(&mut self, entity: EntityId, tags: BuildTags) -> bool {
        let recorded = self.built.entry(entity).or_default();
        if recorded.contains(tags) {
            trace!(entity = %entity, tag = %tags, "already built");
            return true;
        }
        *recorded |= tags;
        false
    }

    /// Whole-entity variant of [`check_is_built_and_tag`](Self::check_is_built_and_tag)
    pub fn check_is_built_and_tag_complete(&mut self, entity: EntityId) -> bool {
        self.check_is_built_and_tag(entity, BuildTags::COMPLETE)
    }

    /// Tags recorded so far for `entity`
    pub fn tags(&self, entity: EntityId) -> BuildTags {
        self.built.get(&entity).copied().unwrap_or_default()
    }

    /// Number of entities with at least one recorded tag
    pub fn len(&self) -> usize {
        self.built.len()
    }

    pub fn is_empty(&self) -> bool {
        self.built.is_empty()
    }
}
