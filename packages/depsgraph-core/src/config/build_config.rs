//! Build configuration
//!
//! Preset first, then builder-style overrides, then `validate()`.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use super::error::{ConfigError, ConfigResult};
use super::io::ConfigExportV1;
use super::preset::Preset;
use crate::shared::models::EvaluationMode;
use depsgraph_alloc::GuardedAllocator;

/// Supported YAML schema versions
pub const SUPPORTED_VERSIONS: &[u32] = &[1];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// Byte budget of the memory tag service; `None` means unlimited
    pub limit_bytes: Option<usize>,
    /// Turn leaked blocks into an error when the allocator is finished
    pub fail_on_leak: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DebugConfig {
    /// Run the graph consistency check after every build
    pub consistency_check: bool,
    /// Log node/relation counts at info level after every build
    pub log_stats: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParallelConfig {
    /// Build independent per-view-layer graphs on the rayon pool
    pub view_layers: bool,
}

/// Complete build configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
    pub preset: Preset,
    pub mode: EvaluationMode,
    pub memory: MemoryConfig,
    pub debug: DebugConfig,
    pub parallel: ParallelConfig,
}

impl BuildConfig {
    /// Level 1: Create from preset
    pub fn preset(preset: Preset) -> Self {
        match preset {
            Preset::Viewport => Self {
                preset,
                mode: EvaluationMode::Viewport,
                memory: MemoryConfig::default(),
                debug: DebugConfig::default(),
                parallel: ParallelConfig { view_layers: true },
            },
            Preset::Render => Self {
                preset,
                mode: EvaluationMode::Render,
                memory: MemoryConfig::default(),
                debug: DebugConfig::default(),
                parallel: ParallelConfig { view_layers: true },
            },
            Preset::Debug => Self {
                preset,
                mode: EvaluationMode::Viewport,
                memory: MemoryConfig {
                    limit_bytes: None,
                    fail_on_leak: true,
                },
                debug: DebugConfig {
                    consistency_check: true,
                    log_stats: true,
                },
                parallel: ParallelConfig { view_layers: false },
            },
        }
    }

    // ============================================================
    // Level 2: Overrides
    // ============================================================

    pub fn mode(mut self, mode: EvaluationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn memory_limit(mut self, limit_bytes: Option<usize>) -> Self {
        self.memory.limit_bytes = limit_bytes;
        self
    }

    pub fn fail_on_leak(mut self, enabled: bool) -> Self {
        self.memory.fail_on_leak = enabled;
        self
    }

    pub fn consistency_check(mut self, enabled: bool) -> Self {
        self.debug.consistency_check = enabled;
        self
    }

    pub fn log_stats(mut self, enabled: bool) -> Self {
        self.debug.log_stats = enabled;
        self
    }

    pub fn parallel_view_layers(mut self, enabled: bool) -> Self {
        self.parallel.view_layers = enabled;
        self
    }

    /// Range checks
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(limit) = self.memory.limit_bytes {
            if limit == 0 {
                return Err(ConfigError::Range {
                    field: "memory.limit_bytes".to_string(),
                    value: limit.to_string(),
                    min: "1".to_string(),
                    max: usize::MAX.to_string(),
                    hint: "Omit the field for an unlimited budget.".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Memory tag service matching the memory settings
    pub fn allocator(&self) -> Arc<GuardedAllocator> {
        let alloc = match self.memory.limit_bytes {
            Some(limit) => GuardedAllocator::with_limit(limit),
            None => GuardedAllocator::new(),
        };
        Arc::new(alloc.fail_on_leak(self.memory.fail_on_leak))
    }

    // ============================================================
    // Level 3: YAML
    // ============================================================

    pub fn from_yaml(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let export: ConfigExportV1 = serde_yaml::from_str(content)?;

        let version = export.version.ok_or(ConfigError::MissingVersion)?;
        if !SUPPORTED_VERSIONS.contains(&version) {
            return Err(ConfigError::UnsupportedVersion {
                found: version,
                supported: SUPPORTED_VERSIONS.to_vec(),
            });
        }

        let preset = Preset::from_str(&export.preset)
            .map_err(|_| ConfigError::UnknownPreset(export.preset.clone()))?;
        let mut config = Self::preset(preset);

        if let Some(overrides) = export.overrides {
            if let Some(mode) = overrides.mode {
                config.mode = mode;
            }
            if let Some(memory) = overrides.memory {
                if memory.limit_bytes.is_some() {
                    config.memory.limit_bytes = memory.limit_bytes;
                }
                if let Some(fail) = memory.fail_on_leak {
                    config.memory.fail_on_leak = fail;
                }
            }
            if let Some(debug) = overrides.debug {
                if let Some(check) = debug.consistency_check {
                    config.debug.consistency_check = check;
                }
                if let Some(log) = debug.log_stats {
                    config.debug.log_stats = log;
                }
            }
            if let Some(parallel) = overrides.parallel {
                if let Some(view_layers) = parallel.view_layers {
                    config.parallel.view_layers = view_layers;
                }
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Export as YAML v1: the preset plus every field as an override
    pub fn to_yaml(&self) -> ConfigResult<String> {
        use super::io::{ConfigOverrides, DebugOverrides, MemoryOverrides, ParallelOverrides};

        let export = ConfigExportV1 {
            version: Some(1),
            preset: self.preset.as_str().to_string(),
            overrides: Some(ConfigOverrides {
                mode: Some(self.mode),
                memory: Some(MemoryOverrides {
                    limit_bytes: self.memory.limit_bytes,
                    fail_on_leak: Some(self.memory.fail_on_leak),
                }),
                debug: Some(DebugOverrides {
                    consistency_check: Some(self.debug.consistency_check),
                    log_stats: Some(self.debug.log_stats),
                }),
                parallel: Some(ParallelOverrides {
                    view_layers: Some(self.parallel.view_layers),
                }),
            }),
        };
        Ok(serde_yaml::to_string(&export)?)
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self::preset(Preset::default())
    }
}
