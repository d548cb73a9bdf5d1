//! Build tags: independent aspects of one entity

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Bit set of already-expanded aspects
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BuildTags(u32);

impl BuildTags {
    pub const NONE: BuildTags = BuildTags(0);
    pub const ANIMATION: BuildTags = BuildTags(1 << 0);
    pub const PARAMETERS: BuildTags = BuildTags(1 << 1);
    pub const TRANSFORM: BuildTags = BuildTags(1 << 2);
    pub const GEOMETRY: BuildTags = BuildTags(1 << 3);
    pub const SCENE_COMPOSITOR: BuildTags = BuildTags(1 << 4);
    pub const SCENE_SEQUENCER: BuildTags = BuildTags(1 << 5);
    pub const SCENE_AUDIO: BuildTags = BuildTags(1 << 6);
    pub const SCENE_SPEAKERS: BuildTags = BuildTags(1 << 7);
    pub const SCENE_SET: BuildTags = BuildTags(1 << 8);

    /// Every aspect: used for whole-entity builds
    pub const COMPLETE: BuildTags = BuildTags((1 << 9) - 1);

    #[inline]
    pub fn bits(&self) -> u32 {
        self.0
    }

    #[inline]
    pub fn contains(&self, other: BuildTags) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl BitOr for BuildTags {
    type Output = BuildTags;

    fn bitor(self, rhs: Self) -> Self::Output {
        BuildTags(self.0 | rhs.0)
    }
}

impl BitOrAssign for BuildTags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for BuildTags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(BuildTags, &str); 9] = [
            (BuildTags::ANIMATION, "ANIMATION"),
            (BuildTags::PARAMETERS, "PARAMETERS"),
            (BuildTags::TRANSFORM, "TRANSFORM"),
            (BuildTags::GEOMETRY, "GEOMETRY"),
            (BuildTags::SCENE_COMPOSITOR, "SCENE_COMPOSITOR"),
            (BuildTags::SCENE_SEQUENCER, "SCENE_SEQUENCER"),
            (BuildTags::SCENE_AUDIO, "SCENE_AUDIO"),
            (BuildTags::SCENE_SPEAKERS, "SCENE_SPEAKERS"),
            (BuildTags::SCENE_SET, "SCENE_SET"),
        ];
        if *self == BuildTags::COMPLETE {
            return f.write_str("COMPLETE");
        }
        let names: Vec<&str> = NAMES
            .iter()
            .filter(|(tag, _)| self.contains(*tag))
            .map(|(_, name)| *name)
            .collect();
        if names.is_empty() {
            f.write_str("NONE")
        } else {
            f.write_str(&names.join("|"))
        }
    }
}
