//! Plugin manifests and preset paths for plugstate.
//!
//! A plugin's identity, parameter layout and factory presets can be described
//! in a TOML manifest instead of code. The manifest builds a
//! [`PluginState`](plugstate_presets::PluginState) ready for hosting or for
//! offline preset tooling.
//!
//! # Features
//!
//! - **Manifest**: Parse and validate plugin manifests from TOML
//! - **Factory Presets**: Plain values by parameter name, loaded into the bank
//! - **Paths**: Per-plugin user preset directories
//!
//! # Example
//!
//! ```rust
//! use plugstate_config::PluginManifest;
//!
//! let manifest = PluginManifest::from_toml(r#"
//!     name = "Gain"
//!     unique_id = "AcGn"
//!
//!     [[params]]
//!     name = "Level"
//!     min = -60.0
//!     max = 12.0
//!     default = 0.0
//!     unit = "db"
//!
//!     [[presets]]
//!     name = "Hot"
//!     values = { Level = 6.0 }
//! "#).unwrap();
//!
//! let state = manifest.build_state().unwrap();
//! assert_eq!(state.preset_name(0).as_deref(), Some("Hot"));
//! ```

mod error;
mod manifest;

/// Platform-specific paths for preset files.
pub mod paths;

pub use error::ConfigError;
pub use manifest::{
    ParamConfig, PluginManifest, PresetConfig, ScaleConfig, UniqueIdConfig, UnitConfig,
    parse_unique_id,
};
pub use paths::{ensure_user_presets_dir, user_presets_dir};
