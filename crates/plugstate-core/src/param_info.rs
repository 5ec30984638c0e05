//! Parameter descriptors: range, normalization curve and display formatting.
//!
//! Each registered parameter is described by a [`ParamDescriptor`]. The
//! descriptor is immutable once the [`ParameterTable`](crate::ParameterTable)
//! is built; only the value changes during a session.
//!
//! # Example
//!
//! ```rust
//! use plugstate_core::{ParamDescriptor, ParamScale};
//!
//! let cutoff = ParamDescriptor::frequency_hz("Cutoff", 20.0, 20000.0, 1000.0);
//! assert_eq!(cutoff.scale, ParamScale::Logarithmic);
//! assert!((cutoff.denormalize(cutoff.normalize(440.0)) - 440.0).abs() < 1e-9);
//! assert_eq!(cutoff.format_value(440.0), "440 Hz");
//! ```

/// Scaling curve for parameter normalization.
///
/// Determines how a parameter's plain value maps to normalized \[0.0, 1.0\]
/// space.
///
/// - **Linear**: `normalized = (value - min) / (max - min)`
/// - **Logarithmic**: `normalized = ln(value/min) / ln(max/min)`
/// - **Power(exp)**: `normalized = ((value - min) / (max - min)).powf(1.0 / exp)`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ParamScale {
    /// Linear mapping (default).
    #[default]
    Linear,
    /// Logarithmic mapping; more resolution at low values. Requires `min > 0.0`.
    Logarithmic,
    /// Power curve with the given exponent.
    /// exponent < 1.0 → more resolution at the high end of the knob travel.
    Power(f64),
}

/// Stable position of a parameter in its table.
///
/// Assigned at registration, contiguous from 0, never reused within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParamIndex(pub usize);

impl From<ParamIndex> for usize {
    fn from(index: ParamIndex) -> Self {
        index.0
    }
}

impl From<usize> for ParamIndex {
    fn from(index: usize) -> Self {
        ParamIndex(index)
    }
}

/// Parameter capability flags for host communication.
///
/// ```rust
/// use plugstate_core::ParamFlags;
///
/// let flags = ParamFlags::AUTOMATABLE.union(ParamFlags::STEPPED);
/// assert!(flags.contains(ParamFlags::STEPPED));
/// assert!(!flags.contains(ParamFlags::HIDDEN));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamFlags(u8);

impl ParamFlags {
    /// No flags set.
    pub const NONE: Self = Self(0);
    /// Host can automate this parameter (default for all params).
    pub const AUTOMATABLE: Self = Self(1 << 0);
    /// Parameter has discrete steps (enum-like, integer values).
    pub const STEPPED: Self = Self(1 << 1);
    /// Parameter should be hidden from generic host UI.
    pub const HIDDEN: Self = Self(1 << 2);
    /// Parameter is read-only (metering, display only).
    pub const READ_ONLY: Self = Self(1 << 3);

    /// Returns `true` if all bits in `other` are set in `self`.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns the union of two flag sets.
    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl Default for ParamFlags {
    fn default() -> Self {
        Self::AUTOMATABLE
    }
}

/// Unit type for parameter display and formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParamUnit {
    /// Decibels (dB).
    Decibels,
    /// Hertz (Hz).
    Hertz,
    /// Milliseconds (ms).
    Milliseconds,
    /// Percentage (%).
    Percent,
    /// Ratio (n:1).
    Ratio,
    /// No unit.
    #[default]
    None,
}

impl ParamUnit {
    /// Returns the unit suffix string for display.
    ///
    /// ```rust
    /// use plugstate_core::ParamUnit;
    ///
    /// assert_eq!(ParamUnit::Decibels.suffix(), " dB");
    /// assert_eq!(ParamUnit::None.suffix(), "");
    /// ```
    pub const fn suffix(&self) -> &'static str {
        match self {
            ParamUnit::Decibels => " dB",
            ParamUnit::Hertz => " Hz",
            ParamUnit::Milliseconds => " ms",
            ParamUnit::Percent => "%",
            ParamUnit::Ratio => ":1",
            ParamUnit::None => "",
        }
    }

    /// Decimal places used when formatting values in this unit.
    const fn precision(&self) -> usize {
        match self {
            ParamUnit::Hertz | ParamUnit::Milliseconds | ParamUnit::Percent => 0,
            ParamUnit::Decibels | ParamUnit::Ratio => 1,
            ParamUnit::None => 2,
        }
    }
}

/// Describes a single parameter's metadata for display and validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDescriptor {
    /// Full parameter name for display (e.g., "Delay Time").
    pub name: String,

    /// Short name for constrained displays.
    pub short_name: String,

    /// Unit type for formatting the parameter value.
    pub unit: ParamUnit,

    /// Minimum allowed value.
    pub min: f64,

    /// Maximum allowed value.
    pub max: f64,

    /// Value the parameter starts at and the default presets are built from.
    pub default: f64,

    /// Recommended step increment; `1.0` for discrete parameters.
    pub step: f64,

    /// Normalization curve.
    pub scale: ParamScale,

    /// Capability flags for hosts.
    pub flags: ParamFlags,

    /// Parameter group for host tree display. Empty means ungrouped.
    pub group: String,
}

impl ParamDescriptor {
    /// Linear, unit-less parameter.
    pub fn new(name: impl Into<String>, min: f64, max: f64, default: f64) -> Self {
        let name = name.into();
        Self {
            short_name: name.clone(),
            name,
            unit: ParamUnit::None,
            min,
            max,
            default,
            step: 0.01,
            scale: ParamScale::Linear,
            flags: ParamFlags::AUTOMATABLE,
            group: String::new(),
        }
    }

    /// Gain in decibels.
    pub fn gain_db(name: impl Into<String>, min: f64, max: f64, default: f64) -> Self {
        Self::new(name, min, max, default)
            .with_unit(ParamUnit::Decibels)
            .with_step(0.5)
    }

    /// Time in milliseconds.
    pub fn time_ms(name: impl Into<String>, min: f64, max: f64, default: f64) -> Self {
        Self::new(name, min, max, default)
            .with_unit(ParamUnit::Milliseconds)
            .with_step(1.0)
    }

    /// Frequency in Hz with logarithmic scaling.
    pub fn frequency_hz(name: impl Into<String>, min: f64, max: f64, default: f64) -> Self {
        Self::new(name, min, max, default)
            .with_unit(ParamUnit::Hertz)
            .with_scale(ParamScale::Logarithmic)
            .with_step(1.0)
    }

    /// Percentage (0–100).
    pub fn percent(name: impl Into<String>, default: f64) -> Self {
        Self::new(name, 0.0, 100.0, default)
            .with_unit(ParamUnit::Percent)
            .with_step(1.0)
    }

    /// On/off switch stored as 0.0 / 1.0.
    pub fn toggle(name: impl Into<String>, default: bool) -> Self {
        Self::new(name, 0.0, 1.0, if default { 1.0 } else { 0.0 })
            .with_step(1.0)
            .with_flags(ParamFlags::AUTOMATABLE.union(ParamFlags::STEPPED))
    }

    /// Discrete choice among `count` options, stored as `0..count-1`.
    pub fn choice(name: impl Into<String>, count: usize, default: usize) -> Self {
        let max = count.saturating_sub(1) as f64;
        Self::new(name, 0.0, max, default as f64)
            .with_step(1.0)
            .with_flags(ParamFlags::AUTOMATABLE.union(ParamFlags::STEPPED))
    }

    /// Sets the short display name.
    pub fn with_short_name(mut self, short_name: impl Into<String>) -> Self {
        self.short_name = short_name.into();
        self
    }

    /// Sets the display unit.
    pub fn with_unit(mut self, unit: ParamUnit) -> Self {
        self.unit = unit;
        self
    }

    /// Sets the normalization scale.
    pub fn with_scale(mut self, scale: ParamScale) -> Self {
        self.scale = scale;
        self
    }

    /// Sets the step increment.
    pub fn with_step(mut self, step: f64) -> Self {
        self.step = step;
        self
    }

    /// Sets the parameter flags.
    pub fn with_flags(mut self, flags: ParamFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Sets the parameter group.
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    /// Clamps a value to this parameter's valid range.
    ///
    /// NaN collapses to the default, itself held inside the range, so a
    /// corrupt chunk cannot poison the table.
    #[inline]
    pub fn clamp(&self, value: f64) -> f64 {
        let value = if value.is_nan() { self.default } else { value };
        if value < self.min {
            self.min
        } else if value > self.max {
            self.max
        } else {
            value
        }
    }

    /// Converts a plain value to normalized range (0.0 to 1.0).
    ///
    /// The value is clamped first.
    #[inline]
    pub fn normalize(&self, value: f64) -> f64 {
        let range = self.max - self.min;
        if range == 0.0 {
            return 0.0;
        }
        let value = self.clamp(value);
        match self.scale {
            ParamScale::Linear => (value - self.min) / range,
            ParamScale::Logarithmic => {
                if self.min <= 0.0 || value <= 0.0 {
                    return 0.0;
                }
                (value / self.min).ln() / (self.max / self.min).ln()
            }
            ParamScale::Power(exp) => ((value - self.min) / range).powf(1.0 / exp),
        }
    }

    /// Converts a normalized value (0.0 to 1.0) to the parameter range.
    ///
    /// Inverse of [`normalize`](Self::normalize). Out-of-range input is clamped
    /// to \[0.0, 1.0\].
    #[inline]
    pub fn denormalize(&self, normalized: f64) -> f64 {
        let n = if normalized.is_nan() {
            return self.default;
        } else {
            normalized.clamp(0.0, 1.0)
        };
        let value = match self.scale {
            ParamScale::Linear => self.min + n * (self.max - self.min),
            ParamScale::Logarithmic => {
                if self.min <= 0.0 {
                    return self.min;
                }
                self.min * (self.max / self.min).powf(n)
            }
            ParamScale::Power(exp) => self.min + n.powf(exp) * (self.max - self.min),
        };
        self.clamp(value)
    }

    /// Default value in normalized form.
    pub fn default_normalized(&self) -> f64 {
        self.normalize(self.default)
    }

    /// Format a plain value for display, with the unit suffix.
    ///
    /// Stepped parameters are shown as integers.
    pub fn format_value(&self, value: f64) -> String {
        let precision = if self.flags.contains(ParamFlags::STEPPED) {
            0
        } else {
            self.unit.precision()
        };
        format!("{:.*}{}", precision, value, self.unit.suffix())
    }

    /// Parse text typed by a user back into a plain value.
    ///
    /// Accepts an optional unit suffix and surrounding whitespace. The result
    /// is clamped to the parameter range.
    pub fn parse_value(&self, text: &str) -> Option<f64> {
        let trimmed = text.trim();
        let suffix = self.unit.suffix().trim();
        let number = trimmed
            .strip_suffix(suffix)
            .filter(|_| !suffix.is_empty())
            .unwrap_or(trimmed)
            .trim();
        number.parse::<f64>().ok().map(|v| self.clamp(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_clamp() {
        let desc = ParamDescriptor::gain_db("Gain", -60.0, 12.0, 0.0);
        assert_eq!(desc.clamp(0.0), 0.0);
        assert_eq!(desc.clamp(-100.0), -60.0);
        assert_eq!(desc.clamp(100.0), 12.0);
        assert_eq!(desc.clamp(f64::NAN), 0.0);
    }

    #[test]
    fn test_nan_falls_back_to_clamped_default() {
        let desc = ParamDescriptor::new("Odd", 0.0, 1.0, 3.0);
        assert_eq!(desc.clamp(f64::NAN), 1.0);
        let desc = ParamDescriptor::new("Low", 0.0, 1.0, -2.0);
        assert_eq!(desc.clamp(f64::NAN), 0.0);
    }

    #[test]
    fn test_normalize_denormalize_linear() {
        let desc = ParamDescriptor::percent("Mix", 50.0);
        assert_eq!(desc.normalize(0.0), 0.0);
        assert_eq!(desc.normalize(50.0), 0.5);
        assert_eq!(desc.normalize(100.0), 1.0);
        assert_eq!(desc.denormalize(0.25), 25.0);
        assert_eq!(desc.denormalize(2.0), 100.0);
    }

    #[test]
    fn test_normalize_denormalize_logarithmic() {
        let desc = ParamDescriptor::frequency_hz("Cutoff", 20.0, 20000.0, 1000.0);

        assert!(desc.normalize(20.0).abs() < 1e-12);
        assert!((desc.normalize(20000.0) - 1.0).abs() < 1e-12);

        // Midpoint in log space: sqrt(20 * 20000) ≈ 632.5
        let mid = desc.denormalize(0.5);
        let expected_mid = (20.0f64 * 20000.0).sqrt();
        assert!(
            (mid - expected_mid).abs() < 1e-6,
            "log midpoint: expected ~{expected_mid}, got {mid}"
        );

        for &val in &[20.0, 100.0, 1000.0, 5000.0, 20000.0] {
            let rt = desc.denormalize(desc.normalize(val));
            assert!(
                (rt - val).abs() / val < 1e-9,
                "log round-trip failed for {val}: got {rt}"
            );
        }
    }

    #[test]
    fn test_normalize_denormalize_power() {
        let desc = ParamDescriptor::percent("Depth", 50.0).with_scale(ParamScale::Power(2.0));

        assert_eq!(desc.normalize(0.0), 0.0);
        assert_eq!(desc.normalize(100.0), 1.0);

        let n = desc.normalize(25.0);
        assert!((n - 0.5).abs() < 1e-12, "power normalize: got {n}");

        let v = desc.denormalize(0.5);
        assert!((v - 25.0).abs() < 1e-9, "power denormalize: got {v}");
    }

    #[test]
    fn test_normalize_zero_range() {
        let desc = ParamDescriptor::gain_db("Fixed", 42.0, 42.0, 42.0);
        assert_eq!(desc.normalize(42.0), 0.0);
        assert_eq!(desc.denormalize(0.7), 42.0);
    }

    #[test]
    fn test_format_value() {
        assert_eq!(
            ParamDescriptor::gain_db("Gain", -60.0, 12.0, 0.0).format_value(-6.3),
            "-6.3 dB"
        );
        assert_eq!(
            ParamDescriptor::time_ms("Attack", 0.1, 100.0, 10.0).format_value(12.4),
            "12 ms"
        );
        assert_eq!(ParamDescriptor::choice("Mode", 4, 1).format_value(2.0), "2");
        assert_eq!(
            ParamDescriptor::new("Amount", 0.0, 1.0, 0.5).format_value(0.333),
            "0.33"
        );
    }

    #[test]
    fn test_parse_value() {
        let desc = ParamDescriptor::gain_db("Gain", -60.0, 12.0, 0.0);
        assert_eq!(desc.parse_value("-6 dB"), Some(-6.0));
        assert_eq!(desc.parse_value(" 3.5 "), Some(3.5));
        assert_eq!(desc.parse_value("40"), Some(12.0));
        assert_eq!(desc.parse_value("loud"), None);

        let mix = ParamDescriptor::percent("Mix", 50.0);
        assert_eq!(mix.parse_value("75%"), Some(75.0));
    }

    #[test]
    fn test_toggle_and_choice() {
        let toggle = ParamDescriptor::toggle("Bypass", true);
        assert_eq!(toggle.default, 1.0);
        assert!(toggle.flags.contains(ParamFlags::STEPPED));

        let choice = ParamDescriptor::choice("Wave", 4, 2);
        assert_eq!(choice.max, 3.0);
        assert_eq!(choice.default, 2.0);
    }

    #[test]
    fn test_param_flags() {
        assert!(ParamFlags::AUTOMATABLE.contains(ParamFlags::AUTOMATABLE));
        assert!(!ParamFlags::AUTOMATABLE.contains(ParamFlags::STEPPED));
        assert!(!ParamFlags::NONE.contains(ParamFlags::AUTOMATABLE));
        assert_eq!(ParamFlags::default(), ParamFlags::AUTOMATABLE);
    }

    #[test]
    fn test_builders() {
        let desc = ParamDescriptor::new("Drive", 0.0, 10.0, 1.0)
            .with_short_name("Drv")
            .with_group("input");
        assert_eq!(desc.name, "Drive");
        assert_eq!(desc.short_name, "Drv");
        assert_eq!(desc.group, "input");
        assert_eq!(desc.default_normalized(), 0.1);
    }
}
