//! Build counters

use ahash::AHashMap;
use serde::Serialize;
use std::fmt;

use crate::shared::models::EntityId;

/// Expansion step a counter refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildStep {
    SceneRender,
    SceneParameters,
    SceneCompositor,
    SceneAudio,
    SceneSequencer,
    SceneSpeakers,
    ViewLayer,
    FromIds,
    Collection,
    Object,
    GeometryDatablock,
    Camera,
    Light,
    Speaker,
    Sound,
    Material,
    World,
    Texture,
    Image,
    NodeTree,
    Animation,
    Action,
    Mask,
    MovieClip,
    CacheFile,
    VFont,
    GenericId,
}

impl fmt::Display for BuildStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Real expansions per (entity, step) plus dedup hits
#[derive(Debug, Clone, Default)]
pub struct BuildStats {
    expansions: AHashMap<(EntityId, BuildStep), usize>,
    dedup_hits: usize,
}

impl BuildStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_expansion(&mut self, entity: EntityId, step: BuildStep) {
        *self.expansions.entry((entity, step)).or_insert(0) += 1;
    }

    pub fn record_dedup_hit(&mut self) {
        self.dedup_hits += 1;
    }

    /// How many times `step` really ran for `entity`
    pub fn expansions(&self, entity: EntityId, step: BuildStep) -> usize {
        self.expansions.get(&(entity, step)).copied().unwrap_or(0)
    }

    /// How many times `step` ran over all entities
    pub fn step_total(&self, step: BuildStep) -> usize {
        self.expansions
            .iter()
            .filter(|((_, s), _)| *s == step)
            .map(|(_, count)| count)
            .sum()
    }

    pub fn total_expansions(&self) -> usize {
        self.expansions.values().sum()
    }

    /// Calls that returned early on an already built (entity, tag)
    pub fn dedup_hits(&self) -> usize {
        self.dedup_hits
    }

    pub fn merge(&mut self, other: &BuildStats) {
        for (key, count) in &other.expansions {
            *self.expansions.entry(*key).or_insert(0) += count;
        }
        self.dedup_hits += other.dedup_hits;
    }
}
