//! A single named preset slot.

use plugstate_core::ByteChunk;

/// Named snapshot of plugin state.
///
/// A slot without a chunk is uninitialized: it was allocated but never
/// populated. The chunk is always a complete state region (custom pre-data,
/// parameters, custom post-data) without a version header.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Preset {
    /// Display name. Not required to be unique.
    pub name: String,

    /// Serialized state, or `None` for an uninitialized slot.
    pub chunk: Option<ByteChunk>,
}

impl Preset {
    /// An allocated slot awaiting first use.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            chunk: None,
        }
    }

    /// A populated preset.
    pub fn with_chunk(name: impl Into<String>, chunk: ByteChunk) -> Self {
        Self {
            name: name.into(),
            chunk: Some(chunk),
        }
    }

    /// Whether the slot holds state.
    pub fn is_initialized(&self) -> bool {
        self.chunk.is_some()
    }
}

/// How a caller addresses a preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetRef<'a> {
    /// Position in the bank.
    Index(usize),
    /// First preset with this exact name.
    Name(&'a str),
}

impl From<usize> for PresetRef<'_> {
    fn from(index: usize) -> Self {
        PresetRef::Index(index)
    }
}

impl<'a> From<&'a str> for PresetRef<'a> {
    fn from(name: &'a str) -> Self {
        PresetRef::Name(name)
    }
}
