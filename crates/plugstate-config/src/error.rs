//! Error types for manifest and path operations.

use std::path::PathBuf;

use plugstate_core::StateError;
use thiserror::Error;

/// Errors that can occur while loading a manifest or building state from it.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to create directory
    #[error("failed to create directory '{path}': {source}")]
    CreateDir {
        /// Path of the directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Invalid parameter definition
    #[error("invalid parameter '{param}': {reason}")]
    InvalidParameter {
        /// Name of the offending parameter.
        param: String,
        /// Description of the problem.
        reason: String,
    },

    /// A factory preset names a parameter the manifest does not define
    #[error("preset '{preset}' sets unknown parameter '{param}'")]
    UnknownParameter {
        /// Preset name.
        preset: String,
        /// Parameter name as written in the preset.
        param: String,
    },

    /// Unique id is neither a four-character code nor an integer
    #[error("invalid unique id '{0}': expected four ASCII characters or an integer")]
    InvalidUniqueId(String),

    /// Version string could not be parsed
    #[error("invalid version '{0}'")]
    InvalidVersion(String),

    /// State error while building presets
    #[error(transparent)]
    State(#[from] StateError),
}

impl ConfigError {
    /// Create a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Create a create directory error.
    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::CreateDir {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid_param(param: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidParameter {
            param: param.to_string(),
            reason: reason.into(),
        }
    }
}
