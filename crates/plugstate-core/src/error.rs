//! Error kinds shared by the chunk, codec and preset layers.

use thiserror::Error;

/// Errors produced while reading, writing or restoring plugin state.
///
/// Lookup misses (`NotFound`) and header probes are recoverable: callers pick a
/// fallback. `Truncated` and `ParameterCountMismatch` during a restore abort the
/// whole restore before any parameter is written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// A typed or byte-span read ran past the end of the chunk.
    #[error("read of {len} bytes at offset {pos} exceeds chunk length {size}")]
    OutOfRange {
        /// Cursor the read started at.
        pos: usize,
        /// Number of bytes requested.
        len: usize,
        /// Length of the chunk.
        size: usize,
    },

    /// The chunk ended before the structure being decoded was complete.
    #[error("chunk truncated: needed {needed} bytes at offset {pos}, {available} available")]
    Truncated {
        /// Cursor the structure started at.
        pos: usize,
        /// Bytes the structure requires.
        needed: usize,
        /// Bytes remaining in the chunk.
        available: usize,
    },

    /// A tag, magic number or version is not one this build understands.
    #[error("format mismatch: {0}")]
    FormatMismatch(String),

    /// The chunk and the live parameter table disagree on parameter count.
    #[error("parameter count mismatch: table has {expected}, got {found}")]
    ParameterCountMismatch {
        /// Parameters registered in the live table.
        expected: usize,
        /// Parameters carried by the incoming data.
        found: usize,
    },

    /// A sparse override referenced an index outside the table.
    #[error("unknown parameter index {0}")]
    UnknownParameter(usize),

    /// Preset lookup miss.
    #[error("preset not found: {0}")]
    NotFound(String),

    /// `modify_current_preset` was called with no active preset.
    #[error("no current preset")]
    NoCurrentPreset,
}

impl StateError {
    /// Create a format mismatch error.
    pub fn format(reason: impl Into<String>) -> Self {
        StateError::FormatMismatch(reason.into())
    }

    /// Re-tag a cursor overrun as a truncated structure.
    ///
    /// The chunk layer only knows that a read ran off the end; the codec knows
    /// which structure was being decoded and reports it as truncated.
    pub fn into_truncated(self) -> Self {
        match self {
            StateError::OutOfRange { pos, len, size } => StateError::Truncated {
                pos,
                needed: len,
                available: size.saturating_sub(pos),
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_display() {
        let err = StateError::OutOfRange {
            pos: 8,
            len: 8,
            size: 12,
        };
        assert_eq!(
            err.to_string(),
            "read of 8 bytes at offset 8 exceeds chunk length 12"
        );
    }

    #[test]
    fn into_truncated_converts_out_of_range() {
        let err = StateError::OutOfRange {
            pos: 8,
            len: 8,
            size: 12,
        }
        .into_truncated();
        assert_eq!(
            err,
            StateError::Truncated {
                pos: 8,
                needed: 8,
                available: 4
            }
        );
    }

    #[test]
    fn into_truncated_keeps_other_kinds() {
        let err = StateError::NoCurrentPreset.into_truncated();
        assert_eq!(err, StateError::NoCurrentPreset);
    }

    #[test]
    fn count_mismatch_display() {
        let err = StateError::ParameterCountMismatch {
            expected: 3,
            found: 2,
        };
        assert_eq!(
            err.to_string(),
            "parameter count mismatch: table has 3, got 2"
        );
    }

    #[test]
    fn format_helper() {
        assert_eq!(
            StateError::format("bad tag"),
            StateError::FormatMismatch("bad tag".to_string())
        );
    }
}
