//! Entity handles
//!
//! Entities are owned by the scene database. The graph only stores
//! [`EntityId`] handles and compares them by value.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable handle of one entity inside a scene database arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u32);

impl EntityId {
    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Entity kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdType {
    Scene,
    Object,
    NodeTree,
    Camera,
    Light,
    Material,
    World,
    Collection,
    Action,
    Sound,
    Speaker,
    Mesh,
    Curve,
    Image,
    Texture,
    Mask,
    MovieClip,
    CacheFile,
    VFont,
    Text,
    Library,
    Brush,
    Palette,
}

impl IdType {
    /// Two-letter code used in debug output
    pub fn code(&self) -> &'static str {
        match self {
            Self::Scene => "SC",
            Self::Object => "OB",
            Self::NodeTree => "NT",
            Self::Camera => "CA",
            Self::Light => "LA",
            Self::Material => "MA",
            Self::World => "WO",
            Self::Collection => "GR",
            Self::Action => "AC",
            Self::Sound => "SO",
            Self::Speaker => "SK",
            Self::Mesh => "ME",
            Self::Curve => "CU",
            Self::Image => "IM",
            Self::Texture => "TE",
            Self::Mask => "MS",
            Self::MovieClip => "MC",
            Self::CacheFile => "CF",
            Self::VFont => "VF",
            Self::Text => "TX",
            Self::Library => "LI",
            Self::Brush => "BR",
            Self::Palette => "PL",
        }
    }

    /// Whether evaluation works on a private copy of this entity
    pub fn needs_copy_on_write(&self) -> bool {
        !matches!(
            self,
            Self::Library | Self::VFont | Self::Brush | Self::Palette | Self::Text | Self::Image
        )
    }

    /// Mesh-like datablocks carrying geometry for an object
    pub fn is_geometry(&self) -> bool {
        matches!(self, Self::Mesh | Self::Curve)
    }
}

impl fmt::Display for IdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
