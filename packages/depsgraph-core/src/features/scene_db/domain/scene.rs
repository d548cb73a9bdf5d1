//! Scene data: render settings, view layers, markers, audio, sequencer

use serde::{Deserialize, Serialize};

use super::entity::IdProperty;
use crate::shared::models::{EntityId, EvaluationMode};

/// `RenderSettings::scemode` bit: run the sequencer when rendering
pub const SCEMODE_DO_SEQUENCER: u32 = 1 << 0;
/// `RenderSettings::scemode` bit: run the compositor when rendering
pub const SCEMODE_DO_COMPOSITE: u32 = 1 << 6;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneData {
    pub render: RenderSettings,
    pub view_layers: Vec<ViewLayer>,
    pub compositor_tree: Option<EntityId>,
    pub markers: Vec<TimeMarker>,
    pub camera: Option<EntityId>,
    pub audio: Option<AudioSettings>,
    pub sequencer: Option<SequencerData>,
    pub world: Option<EntityId>,
    pub master_collection: Option<EntityId>,
    /// Background set scene
    pub background_set: Option<EntityId>,
}

impl SceneData {
    pub fn view_layer(&self, name: &str) -> Option<&ViewLayer> {
        self.view_layers.iter().find(|vl| vl.name == name)
    }

    /// Layer used when the scene is rendered as a set or a strip
    pub fn default_render_layer(&self) -> Option<&ViewLayer> {
        self.view_layers
            .iter()
            .find(|vl| vl.use_for_render)
            .or_else(|| self.view_layers.first())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub scemode: u32,
}

impl RenderSettings {
    pub fn use_compositor(&self) -> bool {
        self.scemode & SCEMODE_DO_COMPOSITE != 0
    }

    pub fn use_sequencer(&self) -> bool {
        self.scemode & SCEMODE_DO_SEQUENCER != 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewLayer {
    pub name: String,
    #[serde(default = "default_true")]
    pub use_for_render: bool,
    #[serde(default)]
    pub bases: Vec<Base>,
    #[serde(default)]
    pub layer_collections: Vec<LayerCollection>,
    #[serde(default)]
    pub material_override: Option<EntityId>,
}

fn default_true() -> bool {
    true
}

impl ViewLayer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            use_for_render: true,
            bases: Vec::new(),
            layer_collections: Vec::new(),
            material_override: None,
        }
    }
}

/// An object instance in a view layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Base {
    pub object: EntityId,
    #[serde(default = "default_true")]
    pub enabled_viewport: bool,
    #[serde(default = "default_true")]
    pub enabled_render: bool,
}

impl Base {
    pub fn new(object: EntityId) -> Self {
        Self {
            object,
            enabled_viewport: true,
            enabled_render: true,
        }
    }

    /// Whether this base contributes to a graph evaluated in `mode`
    pub fn is_enabled(&self, mode: EvaluationMode) -> bool {
        match mode {
            EvaluationMode::Viewport => self.enabled_viewport,
            EvaluationMode::Render => self.enabled_render,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerCollection {
    pub collection: EntityId,
    #[serde(default)]
    pub excluded: bool,
    #[serde(default)]
    pub children: Vec<LayerCollection>,
}

impl LayerCollection {
    pub fn new(collection: EntityId) -> Self {
        Self {
            collection,
            excluded: false,
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeMarker {
    pub name: String,
    #[serde(default)]
    pub frame: i32,
    #[serde(default)]
    pub properties: Vec<IdProperty>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioSettings {
    pub volume: f32,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self { volume: 1.0 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerData {
    pub strips: Vec<Strip>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strip {
    pub name: String,
    #[serde(default)]
    pub properties: Vec<IdProperty>,
    #[serde(default)]
    pub sound: Option<EntityId>,
    #[serde(default)]
    pub scene: Option<EntityId>,
    /// Scene strip also pulls in the strip scene's own sequencer
    #[serde(default)]
    pub scene_strips: bool,
}

impl Strip {
    pub fn sound(name: impl Into<String>, sound: EntityId) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
            sound: Some(sound),
            scene: None,
            scene_strips: false,
        }
    }

    pub fn scene(name: impl Into<String>, scene: EntityId) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
            sound: None,
            scene: Some(scene),
            scene_strips: false,
        }
    }
}
