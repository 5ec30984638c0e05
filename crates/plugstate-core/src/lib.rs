//! Plugstate Core - versioned plugin state
//!
//! This crate turns a plugin's parameters and opaque custom data into a
//! binary chunk and back, and guards the live parameter values shared between
//! the control actor (host, UI, preset load) and the audio actor.
//!
//! # Core Abstractions
//!
//! ## Byte Chunks
//!
//! - [`ByteChunk`] - Growable buffer with typed append and cursor reads
//! - [`ChunkValue`] - Fixed-size values storable in a chunk
//!
//! ## Versioning
//!
//! - [`PluginVersion`] - `0xVVVVRRMM` version code
//! - [`init_chunk_with_version`] / [`get_version_from_chunk`] - 8-byte header
//!   with fallback for headerless legacy chunks
//!
//! ## Parameters
//!
//! - [`ParamDescriptor`] - Range, scale, unit and display formatting
//! - [`ParameterTable`] - Ordered parameters with guarded values
//! - [`ParamValues`] - Guard for whole-table critical sections
//!
//! ## Codec
//!
//! - [`StateCodec`] - Params + custom data to and from chunks, all-or-nothing
//!   restore
//! - [`CustomData`] - Hook for opaque plugin bytes around the parameter block
//!
//! # Features
//!
//! - `tracing`: log header fallbacks and version skew through `tracing`.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use plugstate_core::{ByteChunk, ParamDescriptor, ParameterTable, PluginVersion, StateCodec};
//!
//! let mut builder = ParameterTable::builder();
//! let gain = builder.add(ParamDescriptor::gain_db("Gain", -60.0, 12.0, 0.0));
//! let table = Arc::new(builder.build());
//! let codec = StateCodec::new(Arc::clone(&table));
//! let version = PluginVersion::new(1, 0, 0);
//!
//! table.set_value(gain, -12.0);
//! let mut chunk = ByteChunk::new();
//! codec.serialize_with_header(version, &mut chunk).unwrap();
//!
//! table.reset_to_defaults();
//! codec.unserialize_with_header(&chunk, 0, version).unwrap();
//! assert_eq!(table.value(gain), Some(-12.0));
//! ```

pub mod chunk;
pub mod codec;
pub mod error;
pub mod param_info;
pub mod table;
pub mod version;

pub use chunk::{ByteChunk, ChunkValue};
pub use codec::{CustomData, DecodedState, NoCustomData, PARAM_VALUE_SIZE, StateCodec};
pub use error::StateError;
pub use param_info::{ParamDescriptor, ParamFlags, ParamIndex, ParamScale, ParamUnit};
pub use table::{ParamValues, ParameterTable, TableBuilder};
pub use version::{
    CHUNK_MARKER, HEADER_LEN, PluginVersion, check_compatible, get_version_from_chunk,
    init_chunk_with_version,
};
