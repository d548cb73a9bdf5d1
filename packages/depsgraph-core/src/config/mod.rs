//! Build configuration
//!
//! Three levels, same as everywhere else in the workspace:
//! - Level 1: Preset (`viewport`, `render`, `debug`)
//! - Level 2: Builder-style overrides
//! - Level 3: YAML v1 file
//!
//! # Examples
//!
//! ```rust
//! use depsgraph_core::config::{BuildConfig, Preset};
//!
//! let config = BuildConfig::preset(Preset::Render).memory_limit(Some(64 << 20));
//! assert!(config.validate().is_ok());
//!
//! let yaml = "version: 1\npreset: debug\noverrides:\n  parallel:\n    view_layers: true\n";
//! let config = BuildConfig::from_yaml_str(yaml).unwrap();
//! assert!(config.parallel.view_layers);
//! ```

pub mod build_config;
pub mod error;
pub mod io;
pub mod preset;

// Re-exports
pub use build_config::{BuildConfig, DebugConfig, MemoryConfig, ParallelConfig};
pub use error::{ConfigError, ConfigResult};
pub use io::{ConfigExportV1, ConfigOverrides};
pub use preset::Preset;
