//! Registered parameters and their live values.
//!
//! A [`ParameterTable`] is shared by the control actor (host calls, UI edits,
//! preset and state restore) and the audio actor (reads values every block).
//! Descriptors are fixed when the table is built. Values live behind one
//! `parking_lot::Mutex`, so a whole-table restore is observed by the audio
//! actor either entirely or not at all.
//!
//! The audio actor should read with [`ParameterTable::try_snapshot_into`],
//! which never blocks: when the control actor holds the guard, the audio
//! actor keeps the values it already has for that block.
//!
//! # Example
//!
//! ```rust
//! use plugstate_core::{ParamDescriptor, ParameterTable};
//!
//! let mut builder = ParameterTable::builder();
//! let gain = builder.add(ParamDescriptor::gain_db("Gain", -60.0, 12.0, 0.0));
//! let mix = builder.add(ParamDescriptor::percent("Mix", 50.0));
//! let table = builder.build();
//!
//! table.set_value(gain, -6.0);
//! {
//!     let mut values = table.lock();
//!     values.set(gain, 3.0);
//!     values.set(mix, 100.0);
//! }
//! assert_eq!(table.snapshot(), vec![3.0, 100.0]);
//! ```

use parking_lot::{Mutex, MutexGuard};

use crate::param_info::{ParamDescriptor, ParamIndex};

/// Collects descriptors before the table is frozen.
#[derive(Debug, Default)]
pub struct TableBuilder {
    descriptors: Vec<ParamDescriptor>,
}

impl TableBuilder {
    /// Register a parameter and return its index.
    ///
    /// Indices are assigned in registration order starting at 0.
    pub fn add(&mut self, descriptor: ParamDescriptor) -> ParamIndex {
        self.descriptors.push(descriptor);
        ParamIndex(self.descriptors.len() - 1)
    }

    /// Number of parameters registered so far.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Freeze the layout. Every value starts at its clamped default.
    pub fn build(self) -> ParameterTable {
        let values = self
            .descriptors
            .iter()
            .map(|d| d.clamp(d.default))
            .collect();
        ParameterTable {
            descriptors: self.descriptors,
            values: Mutex::new(values),
        }
    }
}

impl FromIterator<ParamDescriptor> for TableBuilder {
    fn from_iter<I: IntoIterator<Item = ParamDescriptor>>(iter: I) -> Self {
        Self {
            descriptors: iter.into_iter().collect(),
        }
    }
}

/// Ordered collection of parameters with guarded live values.
///
/// Share between actors as `Arc<ParameterTable>`.
#[derive(Debug)]
pub struct ParameterTable {
    descriptors: Vec<ParamDescriptor>,
    values: Mutex<Vec<f64>>,
}

impl ParameterTable {
    /// Start building a table.
    pub fn builder() -> TableBuilder {
        TableBuilder::default()
    }

    /// Number of parameters.
    #[inline]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether the table has no parameters.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Descriptor at `index`.
    pub fn descriptor(&self, index: ParamIndex) -> Option<&ParamDescriptor> {
        self.descriptors.get(index.0)
    }

    /// All descriptors in index order.
    pub fn descriptors(&self) -> &[ParamDescriptor] {
        &self.descriptors
    }

    /// Find a parameter by name or short name, ignoring ASCII case.
    pub fn index_by_name(&self, name: &str) -> Option<ParamIndex> {
        self.descriptors
            .iter()
            .position(|d| {
                d.name.eq_ignore_ascii_case(name) || d.short_name.eq_ignore_ascii_case(name)
            })
            .map(ParamIndex)
    }

    /// Current plain value.
    pub fn value(&self, index: ParamIndex) -> Option<f64> {
        self.values.lock().get(index.0).copied()
    }

    /// Set a plain value, clamped to the parameter range.
    ///
    /// Returns `false` for an unknown index.
    pub fn set_value(&self, index: ParamIndex, value: f64) -> bool {
        self.lock().set(index, value)
    }

    /// Current value normalized to \[0, 1\].
    pub fn normalized(&self, index: ParamIndex) -> Option<f64> {
        let desc = self.descriptors.get(index.0)?;
        self.value(index).map(|v| desc.normalize(v))
    }

    /// Set a value from its normalized form.
    pub fn set_normalized(&self, index: ParamIndex, normalized: f64) -> bool {
        self.lock().set_normalized(index, normalized)
    }

    /// Take the value guard for a whole-table critical section.
    ///
    /// Other actors block (or, with `try_snapshot_into`, skip) until the
    /// guard is dropped. Keep the section short and never call back into the
    /// table while holding it.
    pub fn lock(&self) -> ParamValues<'_> {
        ParamValues {
            descriptors: &self.descriptors,
            values: self.values.lock(),
        }
    }

    /// Copy of every value in index order.
    pub fn snapshot(&self) -> Vec<f64> {
        self.values.lock().clone()
    }

    /// Copy values into `out` without blocking.
    ///
    /// Returns `false` and leaves `out` untouched if another actor holds the
    /// guard or `out` has the wrong length.
    pub fn try_snapshot_into(&self, out: &mut [f64]) -> bool {
        if out.len() != self.descriptors.len() {
            return false;
        }
        match self.values.try_lock() {
            Some(values) => {
                out.copy_from_slice(&values);
                true
            }
            None => false,
        }
    }

    /// Default value of every parameter in index order.
    pub fn defaults(&self) -> Vec<f64> {
        self.descriptors.iter().map(|d| d.clamp(d.default)).collect()
    }

    /// Put every parameter back to its default.
    pub fn reset_to_defaults(&self) {
        let defaults = self.defaults();
        self.lock().apply(&defaults);
    }
}

/// Exclusive access to the live values.
///
/// Returned by [`ParameterTable::lock`]. All writes clamp to the parameter
/// range.
pub struct ParamValues<'a> {
    descriptors: &'a [ParamDescriptor],
    values: MutexGuard<'a, Vec<f64>>,
}

impl ParamValues<'_> {
    /// Plain value at `index`.
    pub fn get(&self, index: ParamIndex) -> Option<f64> {
        self.values.get(index.0).copied()
    }

    /// Set a plain value. Returns `false` for an unknown index.
    pub fn set(&mut self, index: ParamIndex, value: f64) -> bool {
        let i = index.0;
        match (self.descriptors.get(i), self.values.get_mut(i)) {
            (Some(desc), Some(slot)) => {
                *slot = desc.clamp(value);
                true
            }
            _ => false,
        }
    }

    /// Set a value from its normalized form. Returns `false` for an unknown
    /// index.
    pub fn set_normalized(&mut self, index: ParamIndex, normalized: f64) -> bool {
        let i = index.0;
        match self.descriptors.get(i) {
            Some(desc) => {
                let plain = desc.denormalize(normalized);
                self.set(ParamIndex(i), plain)
            }
            None => false,
        }
    }

    /// Values in index order.
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Overwrite every value from a staged vector.
    ///
    /// Extra entries are ignored; missing entries keep their current value.
    pub fn apply(&mut self, staged: &[f64]) {
        for ((slot, desc), &value) in self.values.iter_mut().zip(self.descriptors).zip(staged) {
            *slot = desc.clamp(value);
        }
    }
}
