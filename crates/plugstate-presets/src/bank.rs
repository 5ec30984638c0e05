//! Ordered preset bank with a current-preset cursor.
//!
//! The bank owns preset bodies only. Applying a preset to live parameters
//! always goes through a [`StateCodec`], so a corrupt body fails before any
//! parameter changes.
//!
//! # Bank chunk layout
//!
//! ```text
//! u32   preset count
//! i32   current preset (-1 = none)
//! per preset:
//!   u32 + bytes  name (UTF-8)
//!   u8           initialized flag
//!   u32 + bytes  state region (initialized presets only)
//! ```
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use plugstate_core::{ParamDescriptor, ParameterTable, PluginVersion, StateCodec};
//! use plugstate_presets::{PresetBank, PresetRef};
//!
//! let mut builder = ParameterTable::builder();
//! let mix = builder.add(ParamDescriptor::new("Mix", 0.0, 1.0, 0.5));
//! let table = Arc::new(builder.build());
//! let codec = StateCodec::new(Arc::clone(&table));
//!
//! let mut bank = PresetBank::new();
//! bank.make_default_preset(&codec, Some("Init"), 1).unwrap();
//! bank.make_preset_from_named_params(&codec, "Dry", &[(mix, 0.0)]).unwrap();
//!
//! let version = PluginVersion::new(1, 0, 0);
//! assert!(bank.restore_preset(&codec, version, PresetRef::Name("Dry")).unwrap());
//! assert_eq!(table.value(mix), Some(0.0));
//! assert_eq!(bank.current_index(), Some(1));
//! ```

use plugstate_core::{ByteChunk, ParamIndex, PluginVersion, StateCodec, StateError};

use crate::preset::{Preset, PresetRef};

/// Ordered sequence of presets plus the index of the active one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresetBank {
    presets: Vec<Preset>,
    current: Option<usize>,
}

impl PresetBank {
    /// Empty bank with no current preset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of slots, initialized or not.
    pub fn len(&self) -> usize {
        self.presets.len()
    }

    /// Whether the bank has no slots.
    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    /// Slot at `index`.
    pub fn get(&self, index: usize) -> Option<&Preset> {
        self.presets.get(index)
    }

    /// Name of the slot at `index`.
    pub fn preset_name(&self, index: usize) -> Option<&str> {
        self.presets.get(index).map(|p| p.name.as_str())
    }

    /// Index of the first preset named exactly `name`.
    pub fn find_by_name(&self, name: &str) -> Option<usize> {
        self.presets.iter().position(|p| p.name == name)
    }

    /// Iterate over slots in order.
    pub fn iter(&self) -> impl Iterator<Item = &Preset> {
        self.presets.iter()
    }

    /// Index of the active preset.
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// The active preset.
    pub fn current_preset(&self) -> Option<&Preset> {
        self.current.and_then(|i| self.presets.get(i))
    }

    /// Point the cursor at `index` without applying anything.
    ///
    /// Returns `false` if `index` is out of range.
    pub fn set_current_index(&mut self, index: Option<usize>) -> bool {
        match index {
            Some(i) if i >= self.presets.len() => false,
            _ => {
                self.current = index;
                true
            }
        }
    }

    /// Resolve a reference to a slot index.
    pub fn resolve(&self, preset: PresetRef<'_>) -> Option<usize> {
        match preset {
            PresetRef::Index(i) if i < self.presets.len() => Some(i),
            PresetRef::Index(_) => None,
            PresetRef::Name(name) => self.find_by_name(name),
        }
    }

    /// Append `count` uninitialized slots.
    pub fn allocate(&mut self, count: usize) {
        let start = self.presets.len();
        self.presets
            .extend((start..start + count).map(|i| Preset::empty(default_name(i))));
    }

    /// Fill `count` slots with the parameters' default values.
    ///
    /// Each preset goes into the next uninitialized slot, or is appended when
    /// none is left. With a name, a single preset is called `name` and several
    /// are called `"{name} 1"`, `"{name} 2"`, ...; without one each is called
    /// `"Preset {slot + 1}"`. Returns the slots written.
    pub fn make_default_preset(
        &mut self,
        codec: &StateCodec,
        name: Option<&str>,
        count: usize,
    ) -> Result<Vec<usize>, StateError> {
        let mut chunk = ByteChunk::new();
        codec.serialize_values(&codec.table().defaults(), &mut chunk)?;

        let mut written = Vec::with_capacity(count);
        for k in 1..=count {
            let slot = self.next_slot();
            let name = match name.filter(|n| !n.is_empty()) {
                Some(n) if count == 1 => n.to_string(),
                Some(n) => format!("{n} {k}"),
                None => default_name(slot),
            };
            self.presets[slot] = Preset::with_chunk(name, chunk.clone());
            written.push(slot);
        }
        Ok(written)
    }

    /// Store a preset built from a full list of plain values.
    ///
    /// Fails with `ParameterCountMismatch` unless `values` has one entry per
    /// parameter. Live parameters are not touched.
    pub fn make_preset_from_values(
        &mut self,
        codec: &StateCodec,
        name: &str,
        values: &[f64],
    ) -> Result<usize, StateError> {
        let mut chunk = ByteChunk::new();
        codec.serialize_values(values, &mut chunk)?;
        Ok(self.store(name, chunk))
    }

    /// Store a preset made of the current values with sparse overrides.
    ///
    /// Override values are normalized (0..1). Parameters not listed keep their
    /// current value. Fails with `UnknownParameter` for an index outside the
    /// table, before anything is stored.
    pub fn make_preset_from_named_params(
        &mut self,
        codec: &StateCodec,
        name: &str,
        overrides: &[(ParamIndex, f64)],
    ) -> Result<usize, StateError> {
        let table = codec.table();
        let mut values = table.snapshot();
        for &(index, normalized) in overrides {
            let desc = table
                .descriptor(index)
                .ok_or(StateError::UnknownParameter(index.0))?;
            values[index.0] = desc.denormalize(normalized);
        }
        self.make_preset_from_values(codec, name, &values)
    }

    /// Store caller-provided bytes verbatim as a preset body.
    ///
    /// The body may start with a versioned header; it is checked against the
    /// running version when the preset is restored.
    pub fn make_preset_from_chunk(&mut self, name: &str, chunk: ByteChunk) -> usize {
        self.store(name, chunk)
    }

    /// Overwrite the current preset with the live state.
    ///
    /// `name` renames the preset when given. Fails with `NoCurrentPreset` when
    /// no preset is active.
    pub fn modify_current_preset(
        &mut self,
        codec: &StateCodec,
        name: Option<&str>,
    ) -> Result<usize, StateError> {
        let index = self
            .current
            .filter(|&i| i < self.presets.len())
            .ok_or(StateError::NoCurrentPreset)?;
        let mut chunk = ByteChunk::new();
        codec.serialize_state(&mut chunk)?;

        let preset = &mut self.presets[index];
        preset.chunk = Some(chunk);
        if let Some(name) = name {
            preset.name = name.to_string();
        }
        Ok(index)
    }

    /// Replace the current preset's body and name. Returns its index, or
    /// `None` when no preset is current.
    pub(crate) fn replace_current(&mut self, name: &str, chunk: ByteChunk) -> Option<usize> {
        let index = self.current.filter(|&i| i < self.presets.len())?;
        self.presets[index] = Preset::with_chunk(name, chunk);
        Some(index)
    }

    /// Apply a preset to the live parameters and make it current.
    ///
    /// Returns `Ok(false)` when the preset does not exist or is uninitialized.
    /// A body with a versioned header must be readable by `current`. A corrupt
    /// or incompatible body returns the error with parameters and the current
    /// index unchanged.
    pub fn restore_preset(
        &mut self,
        codec: &StateCodec,
        current: PluginVersion,
        preset: PresetRef<'_>,
    ) -> Result<bool, StateError> {
        let Some(index) = self.resolve(preset) else {
            tracing::debug!("restore_preset: {preset:?} not found");
            return Ok(false);
        };
        let Some(chunk) = self.presets[index].chunk.as_ref() else {
            tracing::debug!("restore_preset: slot {index} is uninitialized");
            return Ok(false);
        };
        codec.unserialize_with_header(chunk, 0, current)?;
        self.current = Some(index);
        tracing::debug!("restored preset {index} '{}'", self.presets[index].name);
        Ok(true)
    }

    /// Remove every uninitialized slot, keeping the order of the rest.
    ///
    /// The current index follows its preset; it becomes `None` if the current
    /// slot itself was removed. Returns the number of slots removed.
    pub fn prune_uninitialized_presets(&mut self) -> usize {
        let before = self.presets.len();
        let mut kept = 0usize;
        let mut new_current = None;
        let current = self.current;
        let mut index = 0usize;
        self.presets.retain(|p| {
            let keep = p.is_initialized();
            if keep {
                if current == Some(index) {
                    new_current = Some(kept);
                }
                kept += 1;
            }
            index += 1;
            keep
        });
        self.current = new_current;
        let removed = before - self.presets.len();
        if removed > 0 {
            tracing::debug!("pruned {removed} uninitialized presets, {kept} remain");
        }
        removed
    }

    /// Append the whole bank to `chunk`.
    pub fn serialize_presets(&self, chunk: &mut ByteChunk) {
        chunk.put(self.presets.len() as u32);
        chunk.put(self.current.map_or(-1, |i| i as i32));
        for preset in &self.presets {
            chunk.put_str(&preset.name);
            chunk.put(preset.is_initialized());
            if let Some(body) = &preset.chunk {
                chunk.put(body.len() as u32);
                chunk.put_chunk(body);
            }
        }
    }

    /// Replace the bank with one read from `chunk` at `pos`.
    ///
    /// Every initialized body must decode against `codec`, header included;
    /// on any failure the bank is left as it was. Live parameters are never
    /// touched. Returns the cursor past the bank.
    pub fn unserialize_presets(
        &mut self,
        codec: &StateCodec,
        current: PluginVersion,
        chunk: &ByteChunk,
        pos: usize,
    ) -> Result<usize, StateError> {
        let (count, pos) = chunk
            .get::<u32>(pos)
            .map_err(StateError::into_truncated)?;
        let (saved_current, mut pos) = chunk
            .get::<i32>(pos)
            .map_err(StateError::into_truncated)?;

        let count = count as usize;
        // Each preset needs at least a name length and a flag.
        if count > chunk.len().saturating_sub(pos) / 5 {
            return Err(StateError::format(format!(
                "bank claims {count} presets in {} bytes",
                chunk.len() - pos
            )));
        }

        let mut presets = Vec::with_capacity(count);
        for _ in 0..count {
            let (name, next) = chunk.get_str(pos).map_err(StateError::into_truncated)?;
            let (initialized, next) = chunk
                .get::<bool>(next)
                .map_err(StateError::into_truncated)?;
            pos = next;
            let body = if initialized {
                let (len, next) = chunk
                    .get::<u32>(pos)
                    .map_err(StateError::into_truncated)?;
                let (bytes, next) = chunk
                    .get_bytes(next, len as usize)
                    .map_err(StateError::into_truncated)?;
                pos = next;
                let body = ByteChunk::from(bytes);
                codec.decode_with_header(&body, 0, current)?;
                Some(body)
            } else {
                None
            };
            presets.push(Preset { name, chunk: body });
        }

        let current = match saved_current {
            -1 => None,
            i if i >= 0 && (i as usize) < presets.len() => Some(i as usize),
            i => {
                return Err(StateError::format(format!(
                    "current preset {i} outside bank of {}",
                    presets.len()
                )));
            }
        };

        tracing::debug!("loaded bank of {} presets", presets.len());
        self.presets = presets;
        self.current = current;
        Ok(pos)
    }

    fn next_slot(&mut self) -> usize {
        match self.presets.iter().position(|p| !p.is_initialized()) {
            Some(slot) => slot,
            None => {
                self.presets.push(Preset::empty(default_name(self.presets.len())));
                self.presets.len() - 1
            }
        }
    }

    fn store(&mut self, name: &str, chunk: ByteChunk) -> usize {
        let slot = self.next_slot();
        self.presets[slot] = Preset::with_chunk(name, chunk);
        slot
    }
}

fn default_name(slot: usize) -> String {
    format!("Preset {}", slot + 1)
}
