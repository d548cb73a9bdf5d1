//! Builder map: idempotent and independent (entity, tag) records

#[path = "../common/mod.rs"]
mod common;

use depsgraph_core::features::builder_map::{BuildTags, BuilderMap};
use depsgraph_core::EntityId;
use proptest::prelude::*;

const SINGLE_TAGS: [BuildTags; 9] = [
    BuildTags::ANIMATION,
    BuildTags::PARAMETERS,
    BuildTags::TRANSFORM,
    BuildTags::GEOMETRY,
    BuildTags::SCENE_COMPOSITOR,
    BuildTags::SCENE_SEQUENCER,
    BuildTags::SCENE_AUDIO,
    BuildTags::SCENE_SPEAKERS,
    BuildTags::SCENE_SET,
];

fn tag_strategy() -> impl Strategy<Value = BuildTags> {
    (0..SINGLE_TAGS.len()).prop_map(|i| SINGLE_TAGS[i])
}

#[test]
fn test_first_call_builds_later_calls_skip() {
    let mut map = BuilderMap::new();
    let scene = EntityId(3);
    assert!(!map.check_is_built_and_tag(scene, BuildTags::SCENE_COMPOSITOR));
    for _ in 0..5 {
        assert!(map.check_is_built_and_tag(scene, BuildTags::SCENE_COMPOSITOR));
    }
    assert_eq!(map.tags(scene), BuildTags::SCENE_COMPOSITOR);
}

#[test]
fn test_complete_after_partial_tag() {
    let mut map = BuilderMap::new();
    let object = EntityId(1);
    assert!(!map.check_is_built_and_tag(object, BuildTags::ANIMATION));
    // Only part of the entity was built, the whole-entity build still runs
    assert!(!map.check_is_built_and_tag_complete(object));
    assert!(map.check_is_built_and_tag_complete(object));
    assert!(map.check_is_built(object, BuildTags::GEOMETRY));
}

#[test]
fn test_combined_tags_need_every_bit() {
    let mut map = BuilderMap::new();
    let id = EntityId(7);
    map.tag_build(id, BuildTags::PARAMETERS);
    assert!(!map.check_is_built(id, BuildTags::PARAMETERS | BuildTags::ANIMATION));
    assert!(map.check_is_built(id, BuildTags::PARAMETERS));
}

proptest! {
    #[test]
    fn prop_idempotent_tagging(entity in 0u32..64, tag in tag_strategy(), repeats in 1usize..8) {
        let mut map = BuilderMap::new();
        let id = EntityId(entity);
        prop_assert!(!map.check_is_built_and_tag(id, tag));
        let after_first = map.tags(id);
        for _ in 0..repeats {
            prop_assert!(map.check_is_built_and_tag(id, tag));
            prop_assert_eq!(map.tags(id), after_first);
            prop_assert_eq!(map.len(), 1);
        }
    }

    #[test]
    fn prop_tags_are_independent(entity in 0u32..64, a in tag_strategy(), b in tag_strategy()) {
        prop_assume!(a != b);
        let mut map = BuilderMap::new();
        let id = EntityId(entity);
        prop_assert!(!map.check_is_built_and_tag(id, a));
        prop_assert!(!map.check_is_built_and_tag(id, b));
        prop_assert!(map.check_is_built_and_tag(id, a));
        prop_assert!(map.check_is_built_and_tag(id, b));
    }

    #[test]
    fn prop_entities_are_independent(first in 0u32..64, second in 0u32..64, tag in tag_strategy()) {
        prop_assume!(first != second);
        let mut map = BuilderMap::new();
        prop_assert!(!map.check_is_built_and_tag(EntityId(first), tag));
        prop_assert!(!map.check_is_built_and_tag(EntityId(second), tag));
        prop_assert_eq!(map.len(), 2);
    }
}
