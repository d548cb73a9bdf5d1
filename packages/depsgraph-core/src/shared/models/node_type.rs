//! Component kinds and operation codes

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a component node: one coherent aspect of an entity's evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Parameters,
    Animation,
    Transform,
    Geometry,
    Shading,
    Sequencer,
    Audio,
    LayerCollections,
    CopyOnWrite,
    Visibility,
    ObjectFromLayer,
    Dupli,
    Synchronization,
    GenericDatablock,
    NTreeOutput,
    Cache,
}

impl NodeType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Parameters => "PARAMETERS",
            Self::Animation => "ANIMATION",
            Self::Transform => "TRANSFORM",
            Self::Geometry => "GEOMETRY",
            Self::Shading => "SHADING",
            Self::Sequencer => "SEQUENCER",
            Self::Audio => "AUDIO",
            Self::LayerCollections => "LAYER_COLLECTIONS",
            Self::CopyOnWrite => "COPY_ON_WRITE",
            Self::Visibility => "VISIBILITY",
            Self::ObjectFromLayer => "OBJECT_FROM_LAYER",
            Self::Dupli => "DUPLI",
            Self::Synchronization => "SYNCHRONIZATION",
            Self::GenericDatablock => "GENERIC_DATABLOCK",
            Self::NTreeOutput => "NTREE_OUTPUT",
            Self::Cache => "CACHE",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One discrete evaluation step inside a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpCode {
    // Parameters
    ParametersEntry,
    ParametersEval,
    ParametersExit,
    Driver,

    // Animation
    AnimationEntry,
    AnimationEval,
    AnimationExit,

    // Scene
    SceneEval,
    ViewLayerEval,

    // Audio and sequencer
    AudioEntry,
    AudioVolume,
    SoundEval,
    SpeakerEval,
    SequencesEval,

    // Object transform
    TransformInit,
    TransformLocal,
    TransformParent,
    TransformConstraints,
    TransformFinal,

    // Flags coming from view layer bases
    ObjectFromLayerEntry,
    ObjectBaseFlags,
    ObjectFromLayerExit,

    // Geometry
    GeometryEvalInit,
    GeometryEval,
    GeometryEvalDone,

    // Shading
    MaterialUpdate,
    WorldUpdate,
    LightUpdate,

    NTreeOutput,
    GenericDatablockUpdate,
    MaskAnimation,
    MaskEval,
    MovieClipEval,
    FileCacheUpdate,

    CopyOnWrite,
    Visibility,
    Dupli,
    SynchronizeToOriginal,
}

impl OpCode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ParametersEntry => "PARAMETERS_ENTRY",
            Self::ParametersEval => "PARAMETERS_EVAL",
            Self::ParametersExit => "PARAMETERS_EXIT",
            Self::Driver => "DRIVER",
            Self::AnimationEntry => "ANIMATION_ENTRY",
            Self::AnimationEval => "ANIMATION_EVAL",
            Self::AnimationExit => "ANIMATION_EXIT",
            Self::SceneEval => "SCENE_EVAL",
            Self::ViewLayerEval => "VIEW_LAYER_EVAL",
            Self::AudioEntry => "AUDIO_ENTRY",
            Self::AudioVolume => "AUDIO_VOLUME",
            Self::SoundEval => "SOUND_EVAL",
            Self::SpeakerEval => "SPEAKER_EVAL",
            Self::SequencesEval => "SEQUENCES_EVAL",
            Self::TransformInit => "TRANSFORM_INIT",
            Self::TransformLocal => "TRANSFORM_LOCAL",
            Self::TransformParent => "TRANSFORM_PARENT",
            Self::TransformConstraints => "TRANSFORM_CONSTRAINTS",
            Self::TransformFinal => "TRANSFORM_FINAL",
            Self::ObjectFromLayerEntry => "OBJECT_FROM_LAYER_ENTRY",
            Self::ObjectBaseFlags => "OBJECT_BASE_FLAGS",
            Self::ObjectFromLayerExit => "OBJECT_FROM_LAYER_EXIT",
            Self::GeometryEvalInit => "GEOMETRY_EVAL_INIT",
            Self::GeometryEval => "GEOMETRY_EVAL",
            Self::GeometryEvalDone => "GEOMETRY_EVAL_DONE",
            Self::MaterialUpdate => "MATERIAL_UPDATE",
            Self::WorldUpdate => "WORLD_UPDATE",
            Self::LightUpdate => "LIGHT_UPDATE",
            Self::NTreeOutput => "NTREE_OUTPUT",
            Self::GenericDatablockUpdate => "GENERIC_DATABLOCK_UPDATE",
            Self::MaskAnimation => "MASK_ANIMATION",
            Self::MaskEval => "MASK_EVAL",
            Self::MovieClipEval => "MOVIECLIP_EVAL",
            Self::FileCacheUpdate => "FILE_CACHE_UPDATE",
            Self::CopyOnWrite => "COPY_ON_WRITE",
            Self::Visibility => "VISIBILITY",
            Self::Dupli => "DUPLI",
            Self::SynchronizeToOriginal => "SYNCHRONIZE_TO_ORIGINAL",
        }
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
