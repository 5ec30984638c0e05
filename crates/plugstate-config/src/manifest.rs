//! Plugin manifest: identity, parameter layout and factory presets.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use plugstate_core::{
    ParamDescriptor, ParamFlags, ParamIndex, ParamScale, ParamUnit, ParameterTable,
    PluginVersion, StateCodec,
};
use plugstate_presets::{PluginInfo, PluginState, legacy::fourcc};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A plugin described in TOML.
///
/// # TOML Format
///
/// ```toml
/// name = "Tape Echo"
/// manufacturer = "Acme"
/// unique_id = "TpEc"
/// version = "1.2.3"
/// state_chunks = true
///
/// [[params]]
/// name = "Gain"
/// min = -60.0
/// max = 12.0
/// default = 0.0
/// unit = "db"
/// step = 0.5
///
/// [[params]]
/// name = "Cutoff"
/// min = 20.0
/// max = 20000.0
/// default = 1000.0
/// unit = "hz"
/// scale = "log"
///
/// [[presets]]
/// name = "Loud"
/// [presets.values]
/// Gain = 6.0
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PluginManifest {
    /// Product name.
    pub name: String,

    /// Vendor name.
    #[serde(default)]
    pub manufacturer: String,

    /// Four-character code or integer id.
    pub unique_id: UniqueIdConfig,

    /// `"major.revision.minor"`.
    #[serde(default = "default_version")]
    pub version: String,

    /// Whether interchange files carry opaque chunks.
    #[serde(default = "default_state_chunks")]
    pub state_chunks: bool,

    /// Parameters in host order.
    #[serde(default)]
    pub params: Vec<ParamConfig>,

    /// Factory presets, in bank order.
    #[serde(default)]
    pub presets: Vec<PresetConfig>,
}

fn default_version() -> String {
    "1.0.0".to_string()
}

fn default_state_chunks() -> bool {
    true
}

/// Unique id as written in the manifest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum UniqueIdConfig {
    /// Integer id.
    Number(u32),
    /// Code or numeric string, see [`parse_unique_id`].
    Text(String),
}

/// One parameter definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParamConfig {
    /// Display name, also the key used by presets.
    pub name: String,
    /// Abbreviated name for narrow displays.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    /// Minimum plain value.
    pub min: f64,
    /// Maximum plain value.
    pub max: f64,
    /// Default plain value.
    pub default: f64,
    /// Display unit.
    #[serde(default)]
    pub unit: UnitConfig,
    /// Normalization curve.
    #[serde(default)]
    pub scale: ScaleConfig,
    /// UI step size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    /// Host group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Discrete values only.
    #[serde(default)]
    pub stepped: bool,
    /// Hidden from generic host UI.
    #[serde(default)]
    pub hidden: bool,
    /// Not automatable by the host.
    #[serde(default)]
    pub read_only: bool,
}

/// Parameter unit names.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UnitConfig {
    /// `"db"`
    #[serde(rename = "db")]
    Decibels,
    /// `"hz"`
    #[serde(rename = "hz")]
    Hertz,
    /// `"ms"`
    #[serde(rename = "ms")]
    Milliseconds,
    /// `"percent"`
    Percent,
    /// `"ratio"`
    Ratio,
    /// `"none"`
    #[default]
    None,
}

impl From<UnitConfig> for ParamUnit {
    fn from(unit: UnitConfig) -> Self {
        match unit {
            UnitConfig::Decibels => ParamUnit::Decibels,
            UnitConfig::Hertz => ParamUnit::Hertz,
            UnitConfig::Milliseconds => ParamUnit::Milliseconds,
            UnitConfig::Percent => ParamUnit::Percent,
            UnitConfig::Ratio => ParamUnit::Ratio,
            UnitConfig::None => ParamUnit::None,
        }
    }
}

/// Normalization curve: `"linear"`, `"log"` or `{ power = 2.0 }`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ScaleConfig {
    /// Straight line.
    #[default]
    Linear,
    /// Logarithmic, requires a positive minimum.
    #[serde(alias = "logarithmic")]
    Log,
    /// Power curve with the given exponent.
    Power(f64),
}

impl From<ScaleConfig> for ParamScale {
    fn from(scale: ScaleConfig) -> Self {
        match scale {
            ScaleConfig::Linear => ParamScale::Linear,
            ScaleConfig::Log => ParamScale::Logarithmic,
            ScaleConfig::Power(exp) => ParamScale::Power(exp),
        }
    }
}

/// A factory preset: plain values keyed by parameter name.
///
/// Parameters not listed keep their default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PresetConfig {
    /// Preset name.
    pub name: String,
    /// Plain values by parameter name.
    #[serde(default)]
    pub values: BTreeMap<String, f64>,
}

/// Parse a unique id written as a number (`"1234"`, `"0x54704563"`) or as
/// four ASCII characters (`"TpEc"`). Numeric forms take precedence.
///
/// ```rust
/// use plugstate_config::parse_unique_id;
///
/// assert_eq!(parse_unique_id("TpEc").unwrap(), 0x5470_4563);
/// assert_eq!(parse_unique_id("1234").unwrap(), 1234);
/// assert!(parse_unique_id("toolong").is_err());
/// ```
pub fn parse_unique_id(text: &str) -> Result<u32, ConfigError> {
    let trimmed = text.trim();
    if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        return u32::from_str_radix(hex, 16)
            .map_err(|_| ConfigError::InvalidUniqueId(text.to_string()));
    }
    if let Ok(id) = trimmed.parse::<u32>() {
        return Ok(id);
    }
    match <[u8; 4]>::try_from(trimmed.as_bytes()) {
        Ok(code) if code.iter().all(|b| b.is_ascii_graphic() || *b == b' ') => Ok(fourcc(code)),
        _ => Err(ConfigError::InvalidUniqueId(text.to_string())),
    }
}

impl UniqueIdConfig {
    /// Resolve to the packed id.
    pub fn resolve(&self) -> Result<u32, ConfigError> {
        match self {
            UniqueIdConfig::Number(id) => Ok(*id),
            UniqueIdConfig::Text(text) => parse_unique_id(text),
        }
    }
}

impl ParamConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let bad = |reason: &str| Err(ConfigError::invalid_param(&self.name, reason));
        if self.name.trim().is_empty() {
            return bad("name is empty");
        }
        if !(self.min.is_finite() && self.max.is_finite() && self.default.is_finite()) {
            return bad("range and default must be finite");
        }
        if self.min > self.max {
            return bad("min is greater than max");
        }
        if self.default < self.min || self.default > self.max {
            return bad("default is outside min..max");
        }
        if self.scale == ScaleConfig::Log && self.min <= 0.0 {
            return bad("log scale needs a positive min");
        }
        if let ScaleConfig::Power(exp) = self.scale
            && !(exp.is_finite() && exp > 0.0)
        {
            return bad("power exponent must be positive");
        }
        if self.step.is_some_and(|s| !(s.is_finite() && s >= 0.0)) {
            return bad("step must be zero or positive");
        }
        Ok(())
    }

    /// Descriptor for this parameter.
    pub fn to_descriptor(&self) -> ParamDescriptor {
        let mut flags = if self.read_only {
            ParamFlags::READ_ONLY
        } else {
            ParamFlags::AUTOMATABLE
        };
        if self.stepped {
            flags = flags.union(ParamFlags::STEPPED);
        }
        if self.hidden {
            flags = flags.union(ParamFlags::HIDDEN);
        }

        let mut desc = ParamDescriptor::new(&self.name, self.min, self.max, self.default)
            .with_unit(self.unit.into())
            .with_scale(self.scale.into())
            .with_flags(flags);
        if let Some(short) = &self.short_name {
            desc = desc.with_short_name(short);
        }
        if let Some(step) = self.step {
            desc = desc.with_step(step);
        }
        if let Some(group) = &self.group {
            desc = desc.with_group(group);
        }
        desc
    }
}

impl PluginManifest {
    /// Load a manifest from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let manifest = Self::from_toml(&content)?;
        tracing::debug!(
            "loaded manifest for '{}' from {}",
            manifest.name,
            path.display()
        );
        Ok(manifest)
    }

    /// Parse a manifest from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Check every parameter and factory preset.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.unique_id.resolve()?;
        self.plugin_version()?;

        let mut seen = Vec::with_capacity(self.params.len());
        for param in &self.params {
            param.validate()?;
            let key = param.name.to_lowercase();
            if seen.contains(&key) {
                return Err(ConfigError::invalid_param(&param.name, "duplicate name"));
            }
            seen.push(key);
        }

        for preset in &self.presets {
            for (param, value) in &preset.values {
                if !seen.contains(&param.to_lowercase()) {
                    return Err(ConfigError::UnknownParameter {
                        preset: preset.name.clone(),
                        param: param.clone(),
                    });
                }
                if !value.is_finite() {
                    return Err(ConfigError::invalid_param(
                        param,
                        format!("preset '{}' gives a non-finite value", preset.name),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Parsed version.
    pub fn plugin_version(&self) -> Result<PluginVersion, ConfigError> {
        self.version
            .parse()
            .map_err(|_| ConfigError::InvalidVersion(self.version.clone()))
    }

    /// Identity block for [`PluginState`].
    pub fn plugin_info(&self) -> Result<PluginInfo, ConfigError> {
        Ok(PluginInfo {
            name: self.name.clone(),
            manufacturer: self.manufacturer.clone(),
            unique_id: self.unique_id.resolve()?,
            version: self.plugin_version()?,
            state_chunks: self.state_chunks,
        })
    }

    /// Validate and build the parameter table.
    pub fn build_table(&self) -> Result<ParameterTable, ConfigError> {
        self.validate()?;
        let mut builder = ParameterTable::builder();
        for param in &self.params {
            builder.add(param.to_descriptor());
        }
        Ok(builder.build())
    }

    /// Validate and build plugin state with the factory bank loaded.
    ///
    /// The first factory preset is current. Without factory presets a single
    /// "Default" preset is created.
    pub fn build_state(&self) -> Result<PluginState, ConfigError> {
        let table = Arc::new(self.build_table()?);
        let state = PluginState::new(self.plugin_info()?, StateCodec::new(Arc::clone(&table)));

        for preset in &self.presets {
            let mut overrides = Vec::with_capacity(preset.values.len());
            for (param, &value) in &preset.values {
                let index = self
                    .param_index(param)
                    .ok_or_else(|| ConfigError::UnknownParameter {
                        preset: preset.name.clone(),
                        param: param.clone(),
                    })?;
                let normalized = table
                    .descriptor(index)
                    .map_or(0.0, |desc| desc.normalize(value));
                overrides.push((index, normalized));
            }
            state.make_preset_from_named_params(&preset.name, &overrides)?;
        }
        state.ensure_default_preset()?;

        tracing::info!(
            "built '{}' with {} parameters and {} presets",
            self.name,
            table.len(),
            state.preset_count()
        );
        Ok(state)
    }

    /// Index of a parameter by name.
    pub fn param_index(&self, name: &str) -> Option<ParamIndex> {
        self.params
            .iter()
            .position(|p| p.name.eq_ignore_ascii_case(name))
            .map(ParamIndex)
    }
}
