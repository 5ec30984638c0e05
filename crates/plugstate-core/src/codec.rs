//! Parameter and custom-data (de)serialization.
//!
//! A state chunk is laid out as:
//!
//! ```text
//! [VersionedHeader]  (only through the *_with_header entry points)
//! [custom pre-data]  opaque, written by CustomData::write_pre
//! [parameters]       one f64 per parameter, index order, no count
//! [custom post-data] opaque, written by CustomData::write_post
//! ```
//!
//! Restores are two-phase. [`StateCodec::decode_state`] parses the whole
//! region without side effects; only after it succeeds are the values and
//! custom data committed, with the table guard held across the full
//! parameter write. A truncated or mismatched chunk therefore leaves the
//! live state exactly as it was.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use plugstate_core::{ByteChunk, ParamDescriptor, ParamIndex, ParameterTable, StateCodec};
//!
//! let mut builder = ParameterTable::builder();
//! builder.add(ParamDescriptor::new("Drive", 0.0, 1.0, 0.2));
//! let table = Arc::new(builder.build());
//! let codec = StateCodec::new(Arc::clone(&table));
//!
//! let mut chunk = ByteChunk::new();
//! codec.serialize_state(&mut chunk).unwrap();
//!
//! table.set_value(ParamIndex(0), 0.9);
//! assert!(!codec.compare_state(chunk.as_slice(), 0));
//!
//! codec.unserialize_state(&chunk, 0).unwrap();
//! assert_eq!(table.value(ParamIndex(0)), Some(0.2));
//! ```

use core::ops::Range;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::chunk::ByteChunk;
use crate::error::StateError;
use crate::table::ParameterTable;
use crate::version::{
    PluginVersion, check_compatible, get_version_from_chunk, init_chunk_with_version,
};

/// Bytes used by one serialized parameter value.
pub const PARAM_VALUE_SIZE: usize = 8;

/// Opaque plugin data stored around the parameter block.
///
/// Implementations append their bytes in `write_pre`/`write_post` and report
/// how far their region extends in `scan_pre`/`scan_post` without touching
/// any live state. `apply` receives the exact byte ranges previously
/// scanned, after the whole chunk has validated.
///
/// All methods default to an empty region.
pub trait CustomData: Send {
    /// Append data that precedes the parameter block.
    fn write_pre(&self, _chunk: &mut ByteChunk) -> Result<(), StateError> {
        Ok(())
    }

    /// Append data that follows the parameter block.
    fn write_post(&self, _chunk: &mut ByteChunk) -> Result<(), StateError> {
        Ok(())
    }

    /// Return the cursor just past the pre-data region starting at `pos`.
    fn scan_pre(&self, _chunk: &ByteChunk, pos: usize) -> Result<usize, StateError> {
        Ok(pos)
    }

    /// Return the cursor just past the post-data region starting at `pos`.
    fn scan_post(&self, _chunk: &ByteChunk, pos: usize) -> Result<usize, StateError> {
        Ok(pos)
    }

    /// Commit regions accepted by `scan_pre` and `scan_post`.
    fn apply(&mut self, _pre: &[u8], _post: &[u8]) {}
}

/// Custom-data hook that stores nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCustomData;

impl CustomData for NoCustomData {}

/// Result of parsing a state region without applying it.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedState {
    /// Parameter values in index order, not yet clamped.
    pub values: Vec<f64>,
    /// Byte range of the custom pre-data.
    pub pre: Range<usize>,
    /// Byte range of the custom post-data.
    pub post: Range<usize>,
    /// Cursor just past the whole region.
    pub end: usize,
}

/// Serializes a [`ParameterTable`] and its custom data to and from chunks.
pub struct StateCodec {
    table: Arc<ParameterTable>,
    custom: Mutex<Box<dyn CustomData>>,
}

impl core::fmt::Debug for StateCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StateCodec")
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

impl StateCodec {
    /// Codec with no custom data.
    pub fn new(table: Arc<ParameterTable>) -> Self {
        Self::with_custom_data(table, NoCustomData)
    }

    /// Codec that interleaves `custom` around the parameter block.
    pub fn with_custom_data(
        table: Arc<ParameterTable>,
        custom: impl CustomData + 'static,
    ) -> Self {
        Self {
            table,
            custom: Mutex::new(Box::new(custom)),
        }
    }

    /// The table this codec reads and writes.
    pub fn table(&self) -> &Arc<ParameterTable> {
        &self.table
    }

    /// Run `f` with exclusive access to the custom-data hook.
    pub fn with_custom<R>(&self, f: impl FnOnce(&mut dyn CustomData) -> R) -> R {
        let mut custom = self.custom.lock();
        f(custom.as_mut())
    }

    /// Size of the parameter block in bytes.
    pub fn params_len(&self) -> usize {
        self.table.len() * PARAM_VALUE_SIZE
    }

    /// Append the live parameter block. Returns the new chunk length.
    ///
    /// Values are copied under a single guard so the block is never a mix of
    /// two edits.
    pub fn serialize_params(&self, chunk: &mut ByteChunk) -> usize {
        let values = self.table.lock();
        for &value in values.as_slice() {
            chunk.put(value);
        }
        chunk.len()
    }

    /// Read a parameter block at `pos` and apply it.
    ///
    /// The block is validated in full before any value is written. Returns the
    /// cursor past the block.
    pub fn unserialize_params(&self, chunk: &ByteChunk, pos: usize) -> Result<usize, StateError> {
        let (values, end) = self.read_params(chunk, pos)?;
        self.table.lock().apply(&values);
        Ok(end)
    }

    /// Append custom pre-data, the live parameters, then custom post-data.
    ///
    /// On failure the chunk is truncated back to its original length.
    pub fn serialize_state(&self, chunk: &mut ByteChunk) -> Result<(), StateError> {
        let start = chunk.len();
        let custom = self.custom.lock();
        let result = custom.write_pre(chunk).and_then(|()| {
            self.serialize_params(chunk);
            custom.write_post(chunk)
        });
        if result.is_err() {
            chunk.truncate(start);
        }
        result
    }

    /// Encode `values` as if they were the live parameters.
    ///
    /// Used to build preset bodies without touching the table. `values` must
    /// have one entry per parameter.
    pub fn serialize_values(
        &self,
        values: &[f64],
        chunk: &mut ByteChunk,
    ) -> Result<(), StateError> {
        if values.len() != self.table.len() {
            return Err(StateError::ParameterCountMismatch {
                expected: self.table.len(),
                found: values.len(),
            });
        }
        let start = chunk.len();
        let custom = self.custom.lock();
        let result = custom.write_pre(chunk).and_then(|()| {
            for (desc, &value) in self.table.descriptors().iter().zip(values) {
                chunk.put(desc.clamp(value));
            }
            custom.write_post(chunk)
        });
        if result.is_err() {
            chunk.truncate(start);
        }
        result
    }

    /// Parse a state region at `pos` without side effects.
    pub fn decode_state(&self, chunk: &ByteChunk, pos: usize) -> Result<DecodedState, StateError> {
        let custom = self.custom.lock();
        self.decode_with(custom.as_ref(), chunk, pos)
    }

    /// Restore custom data and parameters from a state region at `pos`.
    ///
    /// Either everything is applied or nothing is. Returns the cursor past the
    /// region.
    pub fn unserialize_state(&self, chunk: &ByteChunk, pos: usize) -> Result<usize, StateError> {
        let mut custom = self.custom.lock();
        let decoded = self.decode_with(custom.as_ref(), chunk, pos)?;
        {
            let mut values = self.table.lock();
            values.apply(&decoded.values);
        }
        let bytes = chunk.as_slice();
        custom.apply(&bytes[decoded.pre.clone()], &bytes[decoded.post.clone()]);
        Ok(decoded.end)
    }

    /// Whether `bytes[pos..]` starts with the serialized live state.
    ///
    /// Trailing bytes after the state region are ignored.
    pub fn compare_state(&self, bytes: &[u8], pos: usize) -> bool {
        let mut current = ByteChunk::new();
        if self.serialize_state(&mut current).is_err() {
            return false;
        }
        pos.checked_add(current.len())
            .and_then(|end| bytes.get(pos..end))
            .is_some_and(|candidate| candidate == current.as_slice())
    }

    /// Append a versioned header followed by the full state.
    pub fn serialize_with_header(
        &self,
        version: PluginVersion,
        chunk: &mut ByteChunk,
    ) -> Result<(), StateError> {
        let start = chunk.len();
        init_chunk_with_version(chunk, version);
        let result = self.serialize_state(chunk);
        if result.is_err() {
            chunk.truncate(start);
        }
        result
    }

    /// Restore state that may or may not carry a versioned header.
    ///
    /// Headerless data is read as plain state from `pos`. A header from an
    /// incompatible major version is rejected before anything is applied.
    pub fn unserialize_with_header(
        &self,
        chunk: &ByteChunk,
        pos: usize,
        current: PluginVersion,
    ) -> Result<usize, StateError> {
        let pos = self.skip_header(chunk, pos, current)?;
        self.unserialize_state(chunk, pos)
    }

    /// Parse state that may carry a versioned header, without side effects.
    pub fn decode_with_header(
        &self,
        chunk: &ByteChunk,
        pos: usize,
        current: PluginVersion,
    ) -> Result<DecodedState, StateError> {
        let pos = self.skip_header(chunk, pos, current)?;
        self.decode_state(chunk, pos)
    }

    fn skip_header(
        &self,
        chunk: &ByteChunk,
        pos: usize,
        current: PluginVersion,
    ) -> Result<usize, StateError> {
        let (found, next) = get_version_from_chunk(chunk, pos);
        match found {
            Some(found) => {
                check_compatible(found, current)?;
                #[cfg(feature = "tracing")]
                if found != current {
                    tracing::info!("restoring state written by {found} into {current}");
                }
            }
            None => {
                #[cfg(feature = "tracing")]
                tracing::debug!("no version header at offset {pos}, reading as legacy state");
            }
        }
        Ok(next)
    }

    fn decode_with(
        &self,
        custom: &dyn CustomData,
        chunk: &ByteChunk,
        pos: usize,
    ) -> Result<DecodedState, StateError> {
        let pre_end = custom
            .scan_pre(chunk, pos)
            .map_err(StateError::into_truncated)?;
        let (values, params_end) = self.read_params(chunk, pre_end)?;
        let end = custom
            .scan_post(chunk, params_end)
            .map_err(StateError::into_truncated)?;
        if pre_end < pos || end < params_end || end > chunk.len() {
            return Err(StateError::format("custom data reported an invalid region"));
        }
        Ok(DecodedState {
            values,
            pre: pos..pre_end,
            post: params_end..end,
            end,
        })
    }

    fn read_params(&self, chunk: &ByteChunk, pos: usize) -> Result<(Vec<f64>, usize), StateError> {
        let needed = self.params_len();
        chunk
            .get_bytes(pos, needed)
            .map_err(StateError::into_truncated)?;
        let mut values = Vec::with_capacity(self.table.len());
        let mut cursor = pos;
        for _ in 0..self.table.len() {
            let (value, next) = chunk.get::<f64>(cursor)?;
            values.push(value);
            cursor = next;
        }
        Ok((values, cursor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param_info::{ParamDescriptor, ParamIndex};

    fn table(defaults: &[f64]) -> Arc<ParameterTable> {
        let mut builder = ParameterTable::builder();
        for (i, &d) in defaults.iter().enumerate() {
            builder.add(ParamDescriptor::new(format!("P{i}"), 0.0, 1.0, d));
        }
        Arc::new(builder.build())
    }

    /// Length-prefixed blob before the params and a single tag byte after.
    #[derive(Default)]
    struct Blob {
        pre: Vec<u8>,
        tag: u8,
    }

    impl CustomData for Blob {
        fn write_pre(&self, chunk: &mut ByteChunk) -> Result<(), StateError> {
            chunk.put(self.pre.len() as u32);
            chunk.put_bytes(&self.pre);
            Ok(())
        }

        fn write_post(&self, chunk: &mut ByteChunk) -> Result<(), StateError> {
            chunk.put(self.tag);
            Ok(())
        }

        fn scan_pre(&self, chunk: &ByteChunk, pos: usize) -> Result<usize, StateError> {
            let (len, pos) = chunk.get::<u32>(pos)?;
            let (_, end) = chunk.get_bytes(pos, len as usize)?;
            Ok(end)
        }

        fn scan_post(&self, chunk: &ByteChunk, pos: usize) -> Result<usize, StateError> {
            let (_, end) = chunk.get::<u8>(pos)?;
            Ok(end)
        }

        fn apply(&mut self, pre: &[u8], post: &[u8]) {
            self.pre = pre[4..].to_vec();
            self.tag = post[0];
        }
    }

    struct FailingPost;

    impl CustomData for FailingPost {
        fn write_post(&self, _chunk: &mut ByteChunk) -> Result<(), StateError> {
            Err(StateError::format("no room"))
        }
    }

    #[test]
    fn params_round_trip() {
        let table = table(&[0.0, 0.5, 1.0]);
        let codec = StateCodec::new(Arc::clone(&table));
        let mut chunk = ByteChunk::new();
        assert_eq!(codec.serialize_params(&mut chunk), 24);

        table.reset_to_defaults();
        table.lock().apply(&[1.0, 1.0, 1.0]);
        assert_eq!(codec.unserialize_params(&chunk, 0).unwrap(), 24);
        assert_eq!(table.snapshot(), vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn nan_restores_to_in_range_default() {
        let mut builder = ParameterTable::builder();
        builder.add(ParamDescriptor::new("Odd", 0.0, 1.0, 3.0));
        let table = Arc::new(builder.build());
        let codec = StateCodec::new(Arc::clone(&table));
        let mut chunk = ByteChunk::new();
        chunk.put(f64::NAN);

        table.lock().apply(&[0.25]);
        codec.unserialize_state(&chunk, 0).unwrap();
        assert_eq!(table.value(ParamIndex(0)), Some(1.0));
    }

    #[test]
    fn truncated_params_leave_table_alone() {
        let table = table(&[0.0, 0.5, 1.0]);
        let codec = StateCodec::new(Arc::clone(&table));
        let mut chunk = ByteChunk::new();
        codec.serialize_state(&mut chunk).unwrap();
        chunk.truncate(chunk.len() - 1);

        table.lock().apply(&[0.3, 0.3, 0.3]);
        let err = codec.unserialize_state(&chunk, 0).unwrap_err();
        assert_eq!(
            err,
            StateError::Truncated {
                pos: 0,
                needed: 24,
                available: 23
            }
        );
        assert_eq!(table.snapshot(), vec![0.3, 0.3, 0.3]);
    }

    #[test]
    fn values_are_clamped_on_restore() {
        let table = table(&[0.5]);
        let codec = StateCodec::new(Arc::clone(&table));
        let mut chunk = ByteChunk::new();
        chunk.put(7.0f64);
        codec.unserialize_state(&chunk, 0).unwrap();
        assert_eq!(table.value(ParamIndex(0)), Some(1.0));
    }

    #[test]
    fn custom_data_order_round_trips() {
        let table = table(&[0.25, 0.75]);
        let codec = StateCodec::with_custom_data(
            Arc::clone(&table),
            Blob {
                pre: vec![1, 2, 3],
                tag: 9,
            },
        );
        let mut chunk = ByteChunk::new();
        codec.serialize_state(&mut chunk).unwrap();
        // u32 len + 3 bytes, two f64, one tag byte
        assert_eq!(chunk.len(), 4 + 3 + 16 + 1);
        let (tag, _) = chunk.get::<u8>(chunk.len() - 1).unwrap();
        assert_eq!(tag, 9);

        let decoded = codec.decode_state(&chunk, 0).unwrap();
        assert_eq!(decoded.pre, 0..7);
        assert_eq!(decoded.post, 23..24);
        assert_eq!(decoded.values, vec![0.25, 0.75]);

        let other = StateCodec::with_custom_data(Arc::clone(&table), Blob::default());
        table.lock().apply(&[0.0, 0.0]);
        assert_eq!(other.unserialize_state(&chunk, 0).unwrap(), 24);
        assert!(other.compare_state(chunk.as_slice(), 0));
        other.with_custom(|c| {
            let mut out = ByteChunk::new();
            c.write_post(&mut out).unwrap();
            assert_eq!(out.as_slice(), &[9]);
        });
    }

    #[test]
    fn truncated_custom_region_is_reported() {
        let table = table(&[0.5]);
        let codec = StateCodec::with_custom_data(Arc::clone(&table), Blob::default());
        let mut chunk = ByteChunk::new();
        codec.serialize_state(&mut chunk).unwrap();
        chunk.truncate(chunk.len() - 1);
        assert!(matches!(
            codec.unserialize_state(&chunk, 0),
            Err(StateError::Truncated { .. })
        ));
    }

    #[test]
    fn failed_serialize_rolls_back() {
        let table = table(&[0.5]);
        let codec = StateCodec::with_custom_data(table, FailingPost);
        let mut chunk = ByteChunk::from(vec![1, 2, 3]);
        assert!(codec.serialize_state(&mut chunk).is_err());
        assert_eq!(chunk.as_slice(), &[1, 2, 3]);
        assert!(
            codec
                .serialize_with_header(PluginVersion::new(1, 0, 0), &mut chunk)
                .is_err()
        );
        assert_eq!(chunk.len(), 3);
    }

    #[test]
    fn serialize_values_matches_live_encoding() {
        let table = table(&[0.0, 0.0]);
        let codec = StateCodec::new(Arc::clone(&table));
        let mut staged = ByteChunk::new();
        codec.serialize_values(&[0.4, 0.6], &mut staged).unwrap();

        table.lock().apply(&[0.4, 0.6]);
        let mut live = ByteChunk::new();
        codec.serialize_state(&mut live).unwrap();
        assert!(staged.is_equal(&live));

        assert_eq!(
            codec.serialize_values(&[0.1], &mut staged),
            Err(StateError::ParameterCountMismatch {
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn compare_state_detects_changes() {
        let table = table(&[0.1, 0.2]);
        let codec = StateCodec::new(Arc::clone(&table));
        let mut chunk = ByteChunk::new();
        chunk.put_bytes(b"xx");
        codec.serialize_state(&mut chunk).unwrap();
        chunk.put(0xFFu8);

        assert!(codec.compare_state(chunk.as_slice(), 2));
        assert!(!codec.compare_state(chunk.as_slice(), 0));
        assert!(!codec.compare_state(&chunk.as_slice()[..10], 2));
        assert!(!codec.compare_state(chunk.as_slice(), usize::MAX));

        table.set_value(ParamIndex(1), 0.3);
        assert!(!codec.compare_state(chunk.as_slice(), 2));
    }

    #[test]
    fn header_entry_points() {
        let table = table(&[0.5, 0.5]);
        let codec = StateCodec::new(Arc::clone(&table));
        let v1 = PluginVersion::new(1, 0, 0);

        let mut chunk = ByteChunk::new();
        codec.serialize_with_header(v1, &mut chunk).unwrap();
        assert_eq!(chunk.len(), 8 + 16);

        table.lock().apply(&[0.0, 0.0]);
        let end = codec
            .unserialize_with_header(&chunk, 0, PluginVersion::new(1, 3, 0))
            .unwrap();
        assert_eq!(end, chunk.len());
        assert_eq!(table.snapshot(), vec![0.5, 0.5]);

        table.lock().apply(&[0.0, 0.0]);
        let err = codec
            .unserialize_with_header(&chunk, 0, PluginVersion::new(0, 9, 0))
            .unwrap_err();
        assert!(matches!(err, StateError::FormatMismatch(_)));
        assert_eq!(table.snapshot(), vec![0.0, 0.0]);
    }

    #[test]
    fn decode_with_header_skips_header_only() {
        let table = table(&[0.25, 0.75]);
        let codec = StateCodec::new(Arc::clone(&table));
        let v1 = PluginVersion::new(1, 0, 0);
        let mut chunk = ByteChunk::new();
        codec.serialize_with_header(v1, &mut chunk).unwrap();

        table.lock().apply(&[0.0, 0.0]);
        let decoded = codec.decode_with_header(&chunk, 0, v1).unwrap();
        assert_eq!(decoded.values, vec![0.25, 0.75]);
        assert_eq!(decoded.pre, 8..8);
        assert_eq!(decoded.end, chunk.len());
        assert_eq!(table.snapshot(), vec![0.0, 0.0]);

        let plain = codec.decode_with_header(&chunk, 8, v1).unwrap();
        assert_eq!(plain, decoded);
    }

    #[test]
    fn headerless_state_still_loads() {
        let table = table(&[0.5, 0.5]);
        let codec = StateCodec::new(Arc::clone(&table));
        let mut chunk = ByteChunk::new();
        chunk.put(0.125f64);
        chunk.put(0.875f64);
        codec
            .unserialize_with_header(&chunk, 0, PluginVersion::new(2, 0, 0))
            .unwrap();
        assert_eq!(table.snapshot(), vec![0.125, 0.875]);
    }

    #[test]
    fn empty_table_state_is_empty() {
        let codec = StateCodec::new(table(&[]));
        let mut chunk = ByteChunk::new();
        codec.serialize_state(&mut chunk).unwrap();
        assert!(chunk.is_empty());
        assert_eq!(codec.unserialize_state(&chunk, 0).unwrap(), 0);
        assert!(codec.compare_state(&[], 0));
    }
}
