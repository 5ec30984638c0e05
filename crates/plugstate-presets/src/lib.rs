//! Preset banks and host state entry points for plugstate.
//!
//! This crate builds on [`plugstate_core`] to provide what a plugin host
//! integration talks to: a bank of named presets, whole-bank chunks, and the
//! legacy `.fxp`/`.fxb` interchange files.
//!
//! # Features
//!
//! - **Preset Bank**: Named slots holding serialized state, with a current
//!   preset and atomic whole-bank restore
//! - **Host Facade**: [`PluginState`] serializes, restores and compares state
//!   and notifies the host once per change
//! - **Legacy Files**: Big-endian `.fxp`/`.fxb` read and write, parameter-list
//!   or opaque-chunk bodies
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use plugstate_core::{ParamDescriptor, ParamIndex, ParameterTable, PluginVersion, StateCodec};
//! use plugstate_presets::{PluginInfo, PluginState, legacy::fourcc};
//!
//! let mut builder = ParameterTable::builder();
//! builder.add(ParamDescriptor::gain_db("Gain", -60.0, 12.0, 0.0));
//! let codec = StateCodec::new(Arc::new(builder.build()));
//!
//! let state = PluginState::new(
//!     PluginInfo {
//!         name: "Gain".into(),
//!         manufacturer: "Acme".into(),
//!         unique_id: fourcc(*b"AcGn"),
//!         version: PluginVersion::new(1, 0, 0),
//!         state_chunks: true,
//!     },
//!     codec,
//! );
//!
//! state.make_default_preset(Some("Init"), 1).unwrap();
//! state.set_parameter(ParamIndex(0), -6.0);
//! state.make_preset_from_values("Quiet", &[-24.0]).unwrap();
//!
//! let bank = state.save_bank_fxb().unwrap();
//! state.load_bank_fxb(&bank).unwrap();
//! assert_eq!(state.preset_count(), 2);
//! ```

pub mod bank;
mod error;
pub mod legacy;
mod preset;
mod state;

pub use bank::PresetBank;
pub use error::PresetError;
pub use preset::{Preset, PresetRef};
pub use state::{HostNotify, PluginInfo, PluginState, StateChange};
