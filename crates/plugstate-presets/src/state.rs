//! Host-facing plugin state: the entry points a host integration calls.
//!
//! [`PluginState`] owns the codec, the preset bank and the host notification
//! callback. Every call runs on the control actor; the audio actor only ever
//! touches the shared [`ParameterTable`] through its own non-blocking reads.
//!
//! Each successful call that changes what the host should see fires the
//! notification exactly once, after all locks are released, so a callback may
//! call back into the state.
//!
//! Lock order is bank, then custom data, then parameter values.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use parking_lot::Mutex;
use plugstate_core::{
    ByteChunk, ParamIndex, ParameterTable, PluginVersion, StateCodec, StateError,
    check_compatible, get_version_from_chunk, init_chunk_with_version,
};

use crate::bank::PresetBank;
use crate::error::PresetError;
use crate::legacy::{BankBody, BankFile, ProgramBody, ProgramFile};
use crate::preset::{Preset, PresetRef};

/// Identity of the plugin whose state is managed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginInfo {
    /// Product name.
    pub name: String,
    /// Vendor name.
    pub manufacturer: String,
    /// Four-character plugin id, packed big-endian.
    pub unique_id: u32,
    /// Current build version.
    pub version: PluginVersion,
    /// Whether interchange files carry opaque chunks (`FPCh`/`FBCh`) rather
    /// than bare parameter lists (`FxCk`/`FxBk`).
    pub state_chunks: bool,
}

/// What changed, as reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChange {
    /// Full state was restored from a chunk or program file.
    StateRestored,
    /// The preset at this index was applied and is now current.
    PresetRestored(usize),
    /// Presets were added, removed, renamed or overwritten.
    PresetsChanged,
    /// A whole bank was loaded; the index is the preset now current.
    BankLoaded(Option<usize>),
    /// A single parameter was edited.
    ParamChanged(ParamIndex),
}

/// Host notification callback.
pub type HostNotify = Box<dyn Fn(StateChange) + Send + Sync>;

/// Persistent state of one plugin instance.
pub struct PluginState {
    info: PluginInfo,
    codec: StateCodec,
    bank: Mutex<PresetBank>,
    notify: Option<HostNotify>,
}

impl std::fmt::Debug for PluginState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginState")
            .field("info", &self.info)
            .field("codec", &self.codec)
            .field("bank", &*self.bank.lock())
            .finish_non_exhaustive()
    }
}

impl PluginState {
    /// State with an empty bank and no host callback.
    pub fn new(info: PluginInfo, codec: StateCodec) -> Self {
        Self {
            info,
            codec,
            bank: Mutex::new(PresetBank::new()),
            notify: None,
        }
    }

    /// Install the host notification callback.
    pub fn with_host_notify(
        mut self,
        notify: impl Fn(StateChange) + Send + Sync + 'static,
    ) -> Self {
        self.notify = Some(Box::new(notify));
        self
    }

    /// Plugin identity.
    pub fn info(&self) -> &PluginInfo {
        &self.info
    }

    /// The state codec.
    pub fn codec(&self) -> &StateCodec {
        &self.codec
    }

    /// The shared parameter table.
    pub fn table(&self) -> &Arc<ParameterTable> {
        self.codec.table()
    }

    /// Run `f` with read access to the bank.
    pub fn with_bank<R>(&self, f: impl FnOnce(&PresetBank) -> R) -> R {
        f(&self.bank.lock())
    }

    /// Number of preset slots.
    pub fn preset_count(&self) -> usize {
        self.bank.lock().len()
    }

    /// Name of the preset at `index`.
    pub fn preset_name(&self, index: usize) -> Option<String> {
        self.bank.lock().preset_name(index).map(str::to_string)
    }

    /// Index of the current preset.
    pub fn current_preset_index(&self) -> Option<usize> {
        self.bank.lock().current_index()
    }

    fn notify(&self, change: StateChange) {
        if let Some(notify) = &self.notify {
            notify(change);
        }
    }

    // ── Host state entry points ────────────────────────────────────────────

    /// Append the live state (no header).
    pub fn serialize_state(&self, chunk: &mut ByteChunk) -> Result<(), StateError> {
        self.codec.serialize_state(chunk)
    }

    /// Restore live state (no header). All-or-nothing.
    pub fn unserialize_state(&self, chunk: &ByteChunk, pos: usize) -> Result<usize, StateError> {
        let end = self.codec.unserialize_state(chunk, pos)?;
        self.notify(StateChange::StateRestored);
        Ok(end)
    }

    /// Whether `bytes[pos..]` starts with the serialized live state.
    pub fn compare_state(&self, bytes: &[u8], pos: usize) -> bool {
        self.codec.compare_state(bytes, pos)
    }

    /// Append the versioned header and the live state.
    pub fn serialize_with_header(&self, chunk: &mut ByteChunk) -> Result<(), StateError> {
        self.codec.serialize_with_header(self.info.version, chunk)
    }

    /// Restore state written with or without a versioned header.
    pub fn unserialize_with_header(
        &self,
        chunk: &ByteChunk,
        pos: usize,
    ) -> Result<usize, StateError> {
        let end = self
            .codec
            .unserialize_with_header(chunk, pos, self.info.version)?;
        self.notify(StateChange::StateRestored);
        Ok(end)
    }

    /// Set one parameter from the control actor.
    pub fn set_parameter(&self, index: ParamIndex, value: f64) -> bool {
        let changed = self.table().set_value(index, value);
        if changed {
            self.notify(StateChange::ParamChanged(index));
        }
        changed
    }

    /// Set one parameter from its normalized value.
    pub fn set_parameter_normalized(&self, index: ParamIndex, normalized: f64) -> bool {
        let changed = self.table().set_normalized(index, normalized);
        if changed {
            self.notify(StateChange::ParamChanged(index));
        }
        changed
    }

    // ── Presets ────────────────────────────────────────────────────────────

    /// Append `count` uninitialized slots.
    pub fn allocate_presets(&self, count: usize) {
        self.bank.lock().allocate(count);
        if count > 0 {
            self.notify(StateChange::PresetsChanged);
        }
    }

    /// See [`PresetBank::make_default_preset`].
    pub fn make_default_preset(
        &self,
        name: Option<&str>,
        count: usize,
    ) -> Result<Vec<usize>, StateError> {
        let slots = self
            .bank
            .lock()
            .make_default_preset(&self.codec, name, count)?;
        if !slots.is_empty() {
            self.notify(StateChange::PresetsChanged);
        }
        Ok(slots)
    }

    /// See [`PresetBank::make_preset_from_values`].
    pub fn make_preset_from_values(&self, name: &str, values: &[f64]) -> Result<usize, StateError> {
        let slot = self
            .bank
            .lock()
            .make_preset_from_values(&self.codec, name, values)?;
        self.notify(StateChange::PresetsChanged);
        Ok(slot)
    }

    /// See [`PresetBank::make_preset_from_named_params`].
    pub fn make_preset_from_named_params(
        &self,
        name: &str,
        overrides: &[(ParamIndex, f64)],
    ) -> Result<usize, StateError> {
        let slot = self
            .bank
            .lock()
            .make_preset_from_named_params(&self.codec, name, overrides)?;
        self.notify(StateChange::PresetsChanged);
        Ok(slot)
    }

    /// See [`PresetBank::make_preset_from_chunk`].
    pub fn make_preset_from_chunk(&self, name: &str, chunk: ByteChunk) -> usize {
        let slot = self.bank.lock().make_preset_from_chunk(name, chunk);
        self.notify(StateChange::PresetsChanged);
        slot
    }

    /// See [`PresetBank::modify_current_preset`].
    pub fn modify_current_preset(&self, name: Option<&str>) -> Result<usize, StateError> {
        let slot = self
            .bank
            .lock()
            .modify_current_preset(&self.codec, name)?;
        self.notify(StateChange::PresetsChanged);
        Ok(slot)
    }

    /// Apply a preset and make it current.
    ///
    /// Returns `Ok(false)`, without notifying, for a missing or empty preset.
    pub fn restore_preset<'a>(&self, preset: impl Into<PresetRef<'a>>) -> Result<bool, StateError> {
        let restored = {
            let mut bank = self.bank.lock();
            let restored = bank.restore_preset(&self.codec, self.info.version, preset.into())?;
            restored.then(|| bank.current_index()).flatten()
        };
        match restored {
            Some(index) => {
                self.notify(StateChange::PresetRestored(index));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Remove every uninitialized slot. Returns how many were removed.
    pub fn prune_uninitialized_presets(&self) -> usize {
        let removed = self.bank.lock().prune_uninitialized_presets();
        if removed > 0 {
            self.notify(StateChange::PresetsChanged);
        }
        removed
    }

    /// Make sure at least one preset exists and one is current.
    ///
    /// Creates a default preset in an empty bank and restores the first
    /// initialized preset when none is current.
    pub fn ensure_default_preset(&self) -> Result<(), StateError> {
        let change = {
            let mut bank = self.bank.lock();
            let created = if bank.iter().any(Preset::is_initialized) {
                false
            } else {
                bank.make_default_preset(&self.codec, Some("Default"), 1)?;
                true
            };
            let first = bank.iter().position(Preset::is_initialized);
            let version = self.info.version;
            match first {
                Some(i)
                    if bank.current_index().is_none()
                        && bank.restore_preset(&self.codec, version, PresetRef::Index(i))? =>
                {
                    Some(StateChange::PresetRestored(i))
                }
                _ => created.then_some(StateChange::PresetsChanged),
            }
        };
        if let Some(change) = change {
            self.notify(change);
        }
        Ok(())
    }

    /// Append the bank chunk.
    pub fn serialize_presets(&self, chunk: &mut ByteChunk) {
        self.bank.lock().serialize_presets(chunk);
    }

    /// Replace the bank from a bank chunk. Live parameters are not touched.
    pub fn unserialize_presets(&self, chunk: &ByteChunk, pos: usize) -> Result<usize, StateError> {
        let end = self
            .bank
            .lock()
            .unserialize_presets(&self.codec, self.info.version, chunk, pos)?;
        self.notify(StateChange::PresetsChanged);
        Ok(end)
    }

    /// Rust source that recreates the live state as a factory preset.
    ///
    /// Only parameters that differ from their default are listed, as
    /// normalized overrides.
    pub fn dump_preset_source(&self) -> String {
        let table = self.table();
        let name = self.current_name("Untitled");
        let values = table.snapshot();

        let mut out = format!("state.make_preset_from_named_params({name:?}, &[\n");
        for (i, (desc, &value)) in table.descriptors().iter().zip(&values).enumerate() {
            if value == desc.clamp(desc.default) {
                continue;
            }
            out.push_str(&format!(
                "    (ParamIndex({i}), {:.6}), // {} = {}\n",
                desc.normalize(value),
                desc.name,
                desc.format_value(value)
            ));
        }
        out.push_str("])?;\n");
        out
    }

    /// Store a preset from a base64 state blob, as printed by
    /// [`dump_preset_blob`](Self::dump_preset_blob).
    ///
    /// The decoded body must be a valid state for this plugin, with or without
    /// a versioned header. Nothing is stored otherwise.
    pub fn make_preset_from_blob(&self, name: &str, blob: &str) -> Result<usize, StateError> {
        let bytes = BASE64
            .decode(blob.trim())
            .map_err(|e| StateError::format(format!("invalid preset blob: {e}")))?;
        let chunk = ByteChunk::from(bytes);
        self.codec.decode_with_header(&chunk, 0, self.info.version)?;
        Ok(self.make_preset_from_chunk(name, chunk))
    }

    /// Rust source that recreates the live state from a base64 blob.
    ///
    /// Unlike [`dump_preset_source`](Self::dump_preset_source) the blob keeps
    /// custom data and the versioned header.
    pub fn dump_preset_blob(&self) -> Result<String, StateError> {
        let mut chunk = ByteChunk::new();
        self.serialize_with_header(&mut chunk)?;
        Ok(blob_line(&self.current_name("Untitled"), &chunk))
    }

    /// One [`dump_preset_blob`](Self::dump_preset_blob) line per initialized
    /// preset, in bank order.
    pub fn dump_bank_blob(&self) -> String {
        let bank = self.bank.lock();
        bank.iter()
            .filter_map(|p| p.chunk.as_ref().map(|chunk| blob_line(&p.name, chunk)))
            .collect()
    }

    // ── Legacy interchange ─────────────────────────────────────────────────

    fn current_name(&self, fallback: &str) -> String {
        self.bank
            .lock()
            .current_preset()
            .map_or_else(|| fallback.to_string(), |p| p.name.clone())
    }

    fn check_id(&self, found: u32) -> Result<(), StateError> {
        if found == self.info.unique_id {
            Ok(())
        } else {
            Err(StateError::format(format!(
                "file is for plugin {}, this is {}",
                crate::legacy::fourcc_to_string(found),
                crate::legacy::fourcc_to_string(self.info.unique_id)
            )))
        }
    }

    fn normalized_values(&self, values: &[f64]) -> Vec<f32> {
        self.table()
            .descriptors()
            .iter()
            .zip(values)
            .map(|(desc, &v)| desc.normalize(v) as f32)
            .collect()
    }

    fn denormalized_values(&self, count: u32, normalized: &[f32]) -> Result<Vec<f64>, StateError> {
        let table = self.table();
        if count as usize != table.len() || normalized.len() != table.len() {
            return Err(StateError::ParameterCountMismatch {
                expected: table.len(),
                found: count as usize,
            });
        }
        Ok(table
            .descriptors()
            .iter()
            .zip(normalized)
            .map(|(desc, &n)| desc.denormalize(f64::from(n)))
            .collect())
    }

    /// Live state as an `.fxp` image named after the current preset.
    pub fn save_program_fxp(&self) -> Result<Vec<u8>, PresetError> {
        let name = self.current_name("Default");
        let version = self.info.version.raw();
        let program = if self.info.state_chunks {
            let mut chunk = ByteChunk::new();
            self.serialize_with_header(&mut chunk)?;
            ProgramFile::from_chunk(
                self.info.unique_id,
                version,
                self.table().len() as u32,
                name,
                chunk.into_vec(),
            )
        } else {
            let values = self.normalized_values(&self.table().snapshot());
            ProgramFile::from_params(self.info.unique_id, version, name, values)
        };
        Ok(program.write())
    }

    /// Apply an `.fxp` image to the live state.
    ///
    /// The current preset, if any, is overwritten with the loaded state and
    /// takes the program's name. The new body is built before anything is
    /// applied, so a failure leaves the live state and the bank as they were.
    pub fn load_program_fxp(&self, bytes: &[u8]) -> Result<(), PresetError> {
        let program = ProgramFile::read(bytes)?;
        self.check_id(program.unique_id)?;
        let body = match &program.body {
            ProgramBody::Params(normalized) => {
                let values = self.denormalized_values(program.num_params, normalized)?;
                let mut body = ByteChunk::new();
                self.codec.serialize_values(&values, &mut body)?;
                body
            }
            ProgramBody::Chunk(chunk) => {
                let chunk = ByteChunk::from(chunk.as_slice());
                let decoded = self
                    .codec
                    .decode_with_header(&chunk, 0, self.info.version)?;
                ByteChunk::from(&chunk.as_slice()[decoded.pre.start..decoded.end])
            }
        };

        {
            let mut bank = self.bank.lock();
            self.codec.unserialize_state(&body, 0)?;
            bank.replace_current(&program.name, body);
        }
        tracing::info!("loaded program '{}'", program.name);
        self.notify(StateChange::StateRestored);
        Ok(())
    }

    /// The whole bank as an `.fxb` image.
    ///
    /// In parameter-list mode uninitialized slots are exported with default
    /// values, and a bank with no current preset records program 0, since the
    /// header has no way to say "none".
    pub fn save_bank_fxb(&self) -> Result<Vec<u8>, PresetError> {
        let bank = self.bank.lock();
        let version = self.info.version.raw();
        let current = bank.current_index().unwrap_or(0) as u32;

        let file = if self.info.state_chunks {
            let mut chunk = ByteChunk::new();
            init_chunk_with_version(&mut chunk, self.info.version);
            bank.serialize_presets(&mut chunk);
            BankFile::from_chunk(
                self.info.unique_id,
                version,
                bank.len() as u32,
                current,
                chunk.into_vec(),
            )
        } else {
            let defaults = self.table().defaults();
            let mut programs = Vec::with_capacity(bank.len());
            for preset in bank.iter() {
                let values = match &preset.chunk {
                    Some(chunk) => {
                        self.codec
                            .decode_with_header(chunk, 0, self.info.version)?
                            .values
                    }
                    None => defaults.clone(),
                };
                programs.push(ProgramFile::from_params(
                    self.info.unique_id,
                    version,
                    preset.name.clone(),
                    self.normalized_values(&values),
                ));
            }
            BankFile::from_programs(self.info.unique_id, version, current, programs)
        };
        tracing::debug!("saving bank of {} presets", bank.len());
        Ok(file.write())
    }

    /// Replace the bank from an `.fxb` image and restore its current program.
    ///
    /// The bank is only replaced once every program has validated.
    pub fn load_bank_fxb(&self, bytes: &[u8]) -> Result<(), PresetError> {
        let file = BankFile::read(bytes)?;
        self.check_id(file.unique_id)?;

        let mut loaded = PresetBank::new();
        match &file.body {
            BankBody::Chunk(chunk) => {
                let chunk = ByteChunk::from(chunk.as_slice());
                let (found, pos) = get_version_from_chunk(&chunk, 0);
                if let Some(found) = found {
                    check_compatible(found, self.info.version)?;
                }
                loaded.unserialize_presets(&self.codec, self.info.version, &chunk, pos)?;
            }
            BankBody::Programs(programs) => {
                for program in programs {
                    self.check_id(program.unique_id)?;
                    let ProgramBody::Params(normalized) = &program.body else {
                        let reason = "chunk program inside a parameter bank";
                        return Err(StateError::format(reason).into());
                    };
                    let values = self.denormalized_values(program.num_params, normalized)?;
                    loaded.make_preset_from_values(&self.codec, &program.name, &values)?;
                }
                let current = file.current_program as usize;
                loaded.set_current_index((current < loaded.len()).then_some(current));
            }
        }

        let current = {
            let mut bank = self.bank.lock();
            let current = loaded.current_index();
            if let Some(index) = current {
                loaded.restore_preset(&self.codec, self.info.version, PresetRef::Index(index))?;
            }
            *bank = loaded;
            current
        };
        tracing::info!("loaded bank of {} presets", self.preset_count());
        self.notify(StateChange::BankLoaded(current));
        Ok(())
    }

    /// Write [`save_program_fxp`](Self::save_program_fxp) to `path`.
    pub fn save_program_fxp_file(&self, path: impl AsRef<Path>) -> Result<(), PresetError> {
        let path = path.as_ref();
        write_atomic(path, &self.save_program_fxp()?)
    }

    /// Read `path` and [`load_program_fxp`](Self::load_program_fxp).
    pub fn load_program_fxp_file(&self, path: impl AsRef<Path>) -> Result<(), PresetError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| PresetError::read_file(path, e))?;
        self.load_program_fxp(&bytes)
    }

    /// Write [`save_bank_fxb`](Self::save_bank_fxb) to `path`.
    pub fn save_bank_fxb_file(&self, path: impl AsRef<Path>) -> Result<(), PresetError> {
        let path = path.as_ref();
        write_atomic(path, &self.save_bank_fxb()?)
    }

    /// Read `path` and [`load_bank_fxb`](Self::load_bank_fxb).
    pub fn load_bank_fxb_file(&self, path: impl AsRef<Path>) -> Result<(), PresetError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| PresetError::read_file(path, e))?;
        self.load_bank_fxb(&bytes)
    }
}

fn blob_line(name: &str, chunk: &ByteChunk) -> String {
    format!(
        "state.make_preset_from_blob({name:?}, {:?})?;\n",
        BASE64.encode(chunk.as_slice())
    )
}

/// Write `bytes` to a temporary file next to `path`, then rename it over
/// `path`. The target is either fully replaced or left as it was.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), PresetError> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let write_err = |e| PresetError::write_file(path, e);
    let mut file = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    file.write_all(bytes).map_err(write_err)?;
    file.as_file().sync_all().map_err(write_err)?;
    file.persist(path).map_err(|e| write_err(e.error))?;
    tracing::debug!("wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}
