//! Preset configurations
//!
//! Presets provide complete default build configurations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Configuration preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// Interactive editing: viewport visibility, no extra checks
    Viewport,

    /// Final render: render visibility, no extra checks
    Render,

    /// CI and debugging: viewport visibility, consistency check after every
    /// build, stats logged, leaks are errors
    Debug,
}

impl Preset {
    /// Parse preset from string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "viewport" => Ok(Self::Viewport),
            "render" => Ok(Self::Render),
            "debug" => Ok(Self::Debug),
            _ => Err(format!(
                "Unknown preset '{}'. Valid presets: viewport, render, debug",
                s
            )),
        }
    }

    /// Convert to string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Viewport => "viewport",
            Self::Render => "render",
            Self::Debug => "debug",
        }
    }
}

impl Default for Preset {
    fn default() -> Self {
        Self::Viewport
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
