//! Entities and the references the builder follows

use serde::{Deserialize, Serialize};

use super::scene::SceneData;
use crate::shared::models::{EntityId, EvaluationMode, IdType};

/// One externally owned datablock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,

    /// Custom properties; entity references inside are followed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<IdProperty>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anim_data: Option<AnimData>,

    pub data: EntityData,
}

impl Entity {
    pub fn new(name: impl Into<String>, data: EntityData) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
            anim_data: None,
            data,
        }
    }

    pub fn with_properties(mut self, properties: Vec<IdProperty>) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_anim_data(mut self, anim_data: AnimData) -> Self {
        self.anim_data = Some(anim_data);
        self
    }

    pub fn id_type(&self) -> IdType {
        self.data.id_type()
    }
}

/// Type-specific payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntityData {
    Scene(SceneData),
    Object(ObjectData),
    NodeTree(NodeTreeData),
    Camera(CameraData),
    Light(ShadingData),
    Material(ShadingData),
    World(ShadingData),
    Collection(CollectionData),
    Action,
    Sound,
    Speaker(SpeakerData),
    Mesh(GeometryData),
    Curve(GeometryData),
    Image,
    Texture(TextureData),
    Mask,
    MovieClip,
    CacheFile,
    VFont,
    Text,
    Library,
    Brush,
    Palette,
}

impl EntityData {
    pub fn id_type(&self) -> IdType {
        match self {
            Self::Scene(_) => IdType::Scene,
            Self::Object(_) => IdType::Object,
            Self::NodeTree(_) => IdType::NodeTree,
            Self::Camera(_) => IdType::Camera,
            Self::Light(_) => IdType::Light,
            Self::Material(_) => IdType::Material,
            Self::World(_) => IdType::World,
            Self::Collection(_) => IdType::Collection,
            Self::Action => IdType::Action,
            Self::Sound => IdType::Sound,
            Self::Speaker(_) => IdType::Speaker,
            Self::Mesh(_) => IdType::Mesh,
            Self::Curve(_) => IdType::Curve,
            Self::Image => IdType::Image,
            Self::Texture(_) => IdType::Texture,
            Self::Mask => IdType::Mask,
            Self::MovieClip => IdType::MovieClip,
            Self::CacheFile => IdType::CacheFile,
            Self::VFont => IdType::VFont,
            Self::Text => IdType::Text,
            Self::Library => IdType::Library,
            Self::Brush => IdType::Brush,
            Self::Palette => IdType::Palette,
        }
    }
}

// ============================================================
// Custom properties
// ============================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdProperty {
    pub name: String,
    pub value: PropertyValue,
}

impl IdProperty {
    pub fn new(name: impl Into<String>, value: PropertyValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    pub fn id(name: impl Into<String>, target: EntityId) -> Self {
        Self::new(name, PropertyValue::Id(Some(target)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyValue {
    Int(i64),
    Float(f64),
    String(String),
    Id(Option<EntityId>),
    Group(Vec<IdProperty>),
}

/// Every entity referenced from a property list, groups included, in order
pub fn referenced_ids(properties: &[IdProperty]) -> Vec<EntityId> {
    let mut out = Vec::new();
    collect_ids(properties, &mut out);
    out
}

fn collect_ids(properties: &[IdProperty], out: &mut Vec<EntityId>) {
    for property in properties {
        match &property.value {
            PropertyValue::Id(Some(id)) => out.push(*id),
            PropertyValue::Group(children) => collect_ids(children, out),
            _ => {}
        }
    }
}

// ============================================================
// Animation
// ============================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<EntityId>,

    /// Actions of the NLA strips, in track order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nla_strips: Vec<EntityId>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub drivers: Vec<Driver>,
}

impl AnimData {
    pub fn has_animation(&self) -> bool {
        self.action.is_some() || !self.nla_strips.is_empty()
    }

    /// Lookup by the key a driver operation is named after
    pub fn driver(&self, rna_path: &str, array_index: i32) -> Option<&Driver> {
        self.drivers
            .iter()
            .find(|d| d.rna_path == rna_path && d.array_index == array_index)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    pub rna_path: String,
    #[serde(default)]
    pub array_index: i32,
    #[serde(default)]
    pub variables: Vec<DriverVariable>,
}

impl Driver {
    pub fn new(rna_path: impl Into<String>, array_index: i32) -> Self {
        Self {
            rna_path: rna_path.into(),
            array_index,
            variables: Vec::new(),
        }
    }

    pub fn with_target(mut self, name: impl Into<String>, target: EntityId) -> Self {
        self.variables.push(DriverVariable {
            name: name.into(),
            targets: vec![target],
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverVariable {
    pub name: String,
    #[serde(default)]
    pub targets: Vec<EntityId>,
}

// ============================================================
// Objects and object data
// ============================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectData {
    pub parent: Option<EntityId>,
    /// Mesh, curve, camera, light or speaker
    pub data: Option<EntityId>,
    pub constraints: Vec<Constraint>,
    pub modifiers: Vec<Modifier>,
    pub materials: Vec<EntityId>,
    pub instance_collection: Option<EntityId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub name: String,
    #[serde(default)]
    pub targets: Vec<EntityId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modifier {
    pub name: String,
    /// Entities the modifier settings point at
    #[serde(default)]
    pub ids: Vec<EntityId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryData {
    pub materials: Vec<EntityId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraData {
    pub dof_object: Option<EntityId>,
}

/// Light, material and world: shading datablocks with an optional node tree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadingData {
    pub node_tree: Option<EntityId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureData {
    pub node_tree: Option<EntityId>,
    pub image: Option<EntityId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeakerData {
    pub sound: Option<EntityId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionData {
    pub objects: Vec<EntityId>,
    pub children: Vec<EntityId>,
    pub hide_viewport: bool,
    pub hide_render: bool,
}

impl CollectionData {
    /// Restricted for the given evaluation mode
    pub fn is_hidden(&self, mode: EvaluationMode) -> bool {
        match mode {
            EvaluationMode::Viewport => self.hide_viewport,
            EvaluationMode::Render => self.hide_render,
        }
    }
}

// ============================================================
// Node trees
// ============================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeTreeData {
    pub nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub name: String,
    /// Datablock the node points at (image, object, scene, group, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<IdProperty>,
}

impl TreeNode {
    pub fn new(name: impl Into<String>, id: Option<EntityId>) -> Self {
        Self {
            name: name.into(),
            id,
            properties: Vec::new(),
        }
    }
}
