//! Error types for preset and interchange-file operations.

use std::path::PathBuf;

use plugstate_core::StateError;
use thiserror::Error;

/// Errors from preset banks, the host facade and fxp/fxb files.
#[derive(Debug, Error)]
pub enum PresetError {
    /// Chunk decoding, format or lookup failure.
    #[error(transparent)]
    State(#[from] StateError),

    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file
    #[error("failed to write file '{path}': {source}")]
    WriteFile {
        /// Path of the file that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Stream I/O outside of a named file.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl PresetError {
    /// Create a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PresetError::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Create a write file error.
    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PresetError::WriteFile {
            path: path.into(),
            source,
        }
    }

    /// The underlying state error, if this is one.
    pub fn as_state(&self) -> Option<&StateError> {
        match self {
            PresetError::State(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    fn mock_io_err() -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::NotFound, "mock")
    }

    #[test]
    fn read_file_factory_produces_correct_variant() {
        let err = PresetError::read_file("/some/bank.fxb", mock_io_err());
        assert!(
            matches!(err, PresetError::ReadFile { ref path, .. } if path == std::path::Path::new("/some/bank.fxb"))
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn write_file_display_includes_path() {
        let err = PresetError::write_file("/out/prog.fxp", mock_io_err());
        assert!(err.to_string().contains("/out/prog.fxp"));
    }

    #[test]
    fn state_errors_convert_transparently() {
        let err: PresetError = StateError::NoCurrentPreset.into();
        assert_eq!(err.to_string(), "no current preset");
        assert_eq!(err.as_state(), Some(&StateError::NoCurrentPreset));
        assert!(PresetError::from(mock_io_err()).as_state().is_none());
    }
}
