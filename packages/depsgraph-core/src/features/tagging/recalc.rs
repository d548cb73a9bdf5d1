//! Update tag bits addressed to entity components

use serde::{Deserialize, Serialize};
use std::ops::{BitOr, BitOrAssign};

use crate::shared::models::NodeType;

/// Which aspects of an entity changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Recalc(u32);

impl Recalc {
    pub const NONE: Recalc = Recalc(0);
    pub const TRANSFORM: Recalc = Recalc(1 << 0);
    pub const GEOMETRY: Recalc = Recalc(1 << 1);
    pub const SHADING: Recalc = Recalc(1 << 2);
    pub const ANIMATION: Recalc = Recalc(1 << 3);
    pub const PARAMETERS: Recalc = Recalc(1 << 4);
    pub const AUDIO: Recalc = Recalc(1 << 5);
    pub const SEQUENCER: Recalc = Recalc(1 << 6);
    pub const ALL: Recalc = Recalc((1 << 7) - 1);

    const COMPONENTS: [(Recalc, NodeType); 7] = [
        (Recalc::TRANSFORM, NodeType::Transform),
        (Recalc::GEOMETRY, NodeType::Geometry),
        (Recalc::SHADING, NodeType::Shading),
        (Recalc::ANIMATION, NodeType::Animation),
        (Recalc::PARAMETERS, NodeType::Parameters),
        (Recalc::AUDIO, NodeType::Audio),
        (Recalc::SEQUENCER, NodeType::Sequencer),
    ];

    #[inline]
    pub fn contains(&self, other: Recalc) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Component kinds addressed by the set bits
    pub fn components(&self) -> Vec<NodeType> {
        Self::COMPONENTS
            .iter()
            .filter(|(bit, _)| self.contains(*bit))
            .map(|(_, node_type)| *node_type)
            .collect()
    }
}

impl BitOr for Recalc {
    type Output = Recalc;

    fn bitor(self, rhs: Self) -> Self::Output {
        Recalc(self.0 | rhs.0)
    }
}

impl BitOrAssign for Recalc {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}
