//! YAML schema types

use serde::{Deserialize, Serialize};

use crate::shared::models::EvaluationMode;

/// YAML Schema v1
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigExportV1 {
    /// Schema version (always 1 for v1)
    #[serde(default)]
    pub version: Option<u32>,

    /// Base preset
    pub preset: String,

    /// Fine-grained overrides
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overrides: Option<ConfigOverrides>,
}

/// Configuration overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<EvaluationMode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<MemoryOverrides>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<DebugOverrides>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallel: Option<ParallelOverrides>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit_bytes: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_on_leak: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DebugOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consistency_check: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_stats: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParallelOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_layers: Option<bool>,
}
