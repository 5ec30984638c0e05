//! Plugin version codes and the versioned chunk header.
//!
//! Every chunk written through the header-aware codec entry points starts
//! with an 8-byte header:
//!
//! | offset | size | field |
//! |--------|------|-------|
//! | 0 | 4 | format marker `b"PSck"` |
//! | 4 | 4 | plugin version `0xVVVVRRMM` (native byte order) |
//!
//! Chunks written before the header existed start directly with parameter
//! data. [`get_version_from_chunk`] therefore sniffs: it only reports a header
//! when at least [`HEADER_LEN`] bytes remain **and** the marker matches.
//! Anything else is treated as headerless and the cursor is left where it was.

use core::fmt;
use core::str::FromStr;

use crate::chunk::ByteChunk;
use crate::error::StateError;

/// Marker identifying a versioned chunk.
pub const CHUNK_MARKER: [u8; 4] = *b"PSck";

/// Length of the versioned header in bytes.
pub const HEADER_LEN: usize = 8;

/// Plugin version packed as `0xVVVVRRMM`.
///
/// `VVVV` is the major version, `RR` the revision and `MM` the minor
/// revision.
///
/// ```rust
/// use plugstate_core::PluginVersion;
///
/// let v = PluginVersion::new(1, 2, 3);
/// assert_eq!(v.raw(), 0x0001_0203);
/// assert_eq!(v.decimal(), 10203);
/// assert_eq!(v.to_string(), "v1.2.3");
/// assert_eq!("1.2.3".parse::<PluginVersion>().unwrap(), v);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PluginVersion(pub u32);

impl PluginVersion {
    /// Pack a version from its parts.
    pub const fn new(major: u16, revision: u8, minor: u8) -> Self {
        Self(((major as u32) << 16) | ((revision as u32) << 8) | minor as u32)
    }

    /// Raw `0xVVVVRRMM` code.
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Major version (`VVVV`).
    pub const fn major(self) -> u16 {
        (self.0 >> 16) as u16
    }

    /// Revision (`RR`).
    pub const fn revision(self) -> u8 {
        (self.0 >> 8) as u8
    }

    /// Minor revision (`MM`).
    pub const fn minor(self) -> u8 {
        self.0 as u8
    }

    /// Version as the decimal number `VVVVRRMM` (e.g. `10203` for 1.2.3).
    pub const fn decimal(self) -> u32 {
        self.major() as u32 * 10_000 + self.revision() as u32 * 100 + self.minor() as u32
    }

    /// Whether state written by `self` can be read by a build at `current`.
    ///
    /// Any chunk with the same or an older major version is accepted.
    pub const fn is_readable_by(self, current: PluginVersion) -> bool {
        self.major() <= current.major()
    }
}

impl fmt::Display for PluginVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}.{}.{}", self.major(), self.revision(), self.minor())
    }
}

impl FromStr for PluginVersion {
    type Err = StateError;

    /// Parse `"major.revision.minor"`; missing trailing parts default to 0 and
    /// a leading `v` is accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('v');
        let mut parts = trimmed.split('.');
        let bad = || StateError::format(format!("invalid version string '{s}'"));

        let major = parts
            .next()
            .filter(|p| !p.is_empty())
            .ok_or_else(bad)?
            .parse::<u16>()
            .map_err(|_| bad())?;
        let revision = parts
            .next()
            .map_or(Ok(0), |p| p.parse::<u8>())
            .map_err(|_| bad())?;
        let minor = parts
            .next()
            .map_or(Ok(0), |p| p.parse::<u8>())
            .map_err(|_| bad())?;
        if parts.next().is_some() {
            return Err(bad());
        }
        Ok(Self::new(major, revision, minor))
    }
}

/// Append the versioned header to `chunk`.
pub fn init_chunk_with_version(chunk: &mut ByteChunk, version: PluginVersion) -> usize {
    chunk.put_bytes(&CHUNK_MARKER);
    chunk.put(version.raw())
}

/// Probe for a versioned header at `pos`.
///
/// Returns `(Some(version), pos + HEADER_LEN)` when a header is present and
/// `(None, pos)` for headerless data.
pub fn get_version_from_chunk(chunk: &ByteChunk, pos: usize) -> (Option<PluginVersion>, usize) {
    if chunk.len().saturating_sub(pos) < HEADER_LEN {
        return (None, pos);
    }
    match chunk.get_bytes(pos, CHUNK_MARKER.len()) {
        Ok((marker, next)) if marker == CHUNK_MARKER => match chunk.get::<u32>(next) {
            Ok((raw, end)) => (Some(PluginVersion(raw)), end),
            Err(_) => (None, pos),
        },
        _ => (None, pos),
    }
}

/// Reject chunks written by a newer, incompatible major version.
pub fn check_compatible(found: PluginVersion, current: PluginVersion) -> Result<(), StateError> {
    if found.is_readable_by(current) {
        Ok(())
    } else {
        Err(StateError::format(format!(
            "chunk written by {found}, this build is {current}"
        )))
    }
}
