//! Shared helpers for commands.

use std::path::Path;

use anyhow::{Context, bail};
use plugstate_config::PluginManifest;
use plugstate_presets::PluginState;
use plugstate_presets::legacy::{
    BANK_CHUNK, BANK_PARAMS, BankFile, PROGRAM_CHUNK, PROGRAM_PARAMS, ProgramFile,
};

/// Which legacy container a file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// `.fxp`
    Program,
    /// `.fxb`
    Bank,
}

/// Classify legacy file bytes by the tag after the container header.
pub fn file_kind(bytes: &[u8]) -> anyhow::Result<FileKind> {
    let Some(tag) = bytes.get(8..12) else {
        bail!("file too short for a preset container ({} bytes)", bytes.len());
    };
    match <[u8; 4]>::try_from(tag)? {
        PROGRAM_PARAMS | PROGRAM_CHUNK => Ok(FileKind::Program),
        BANK_PARAMS | BANK_CHUNK => Ok(FileKind::Bank),
        other => bail!("unknown container kind {:?}", String::from_utf8_lossy(&other)),
    }
}

/// Parsed legacy file.
pub enum LegacyFile {
    /// Single program.
    Program(ProgramFile),
    /// Bank.
    Bank(BankFile),
}

/// Read and parse an `.fxp` or `.fxb` file.
pub fn read_legacy(path: &Path) -> anyhow::Result<(Vec<u8>, LegacyFile)> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let file = match file_kind(&bytes)? {
        FileKind::Program => LegacyFile::Program(ProgramFile::read(&bytes)?),
        FileKind::Bank => LegacyFile::Bank(BankFile::read(&bytes)?),
    };
    Ok((bytes, file))
}

/// Load a manifest and build its plugin state.
pub fn load_plugin(manifest: &Path) -> anyhow::Result<PluginState> {
    let manifest = PluginManifest::load(manifest)?;
    Ok(manifest.build_state()?)
}
