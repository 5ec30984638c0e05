//! Platform-specific locations for exported preset files.
//!
//! # Directory Structure
//!
//! - **User presets**: `~/.config/plugstate/presets/<plugin>/` (Linux),
//!   `~/Library/Application Support/plugstate/presets/<plugin>/` (macOS),
//!   `%APPDATA%\plugstate\presets\<plugin>\` (Windows)
//!
//! # Example
//!
//! ```rust,no_run
//! use plugstate_config::paths;
//!
//! let dir = paths::ensure_user_presets_dir("Tape Echo").unwrap();
//! for file in paths::list_preset_files(&dir) {
//!     println!("{}", file.display());
//! }
//! ```

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Application name used for directory paths.
const APP_NAME: &str = "plugstate";

/// Subdirectory name for presets.
const PRESETS_SUBDIR: &str = "presets";

/// Extensions recognized as preset files.
pub const PRESET_EXTENSIONS: [&str; 2] = ["fxp", "fxb"];

/// Root of all user preset directories.
///
/// Returns a path relative to the working directory if the config directory
/// cannot be determined.
pub fn user_presets_root() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
        .join(PRESETS_SUBDIR)
}

/// Presets directory for one plugin.
///
/// Path separators and other characters that are unsafe in file names are
/// replaced with `_`.
pub fn user_presets_dir(plugin: &str) -> PathBuf {
    user_presets_root().join(sanitize(plugin))
}

/// Create the plugin's presets directory if needed and return it.
pub fn ensure_user_presets_dir(plugin: &str) -> Result<PathBuf, ConfigError> {
    let dir = user_presets_dir(plugin);
    ensure_dir(&dir)?;
    Ok(dir)
}

fn ensure_dir(dir: &Path) -> Result<(), ConfigError> {
    if !dir.exists() {
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::create_dir(dir, e))?;
        tracing::debug!("created presets directory {}", dir.display());
    }
    Ok(())
}

/// `.fxp` and `.fxb` files in `dir`, sorted by name.
///
/// A missing or unreadable directory yields an empty list.
pub fn list_preset_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file() && is_preset_file(p))
        .collect();
    files.sort();
    files
}

/// Whether `path` has a preset file extension.
pub fn is_preset_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| PRESET_EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)))
}

/// Resolve a preset by path or by name in the plugin's presets directory.
///
/// A bare name is tried with each extension in turn.
pub fn find_preset(plugin: &str, name: &str) -> Option<PathBuf> {
    let path = PathBuf::from(name);
    if path.is_file() {
        return Some(path);
    }
    find_preset_in(&user_presets_dir(plugin), name)
}

fn find_preset_in(dir: &Path, name: &str) -> Option<PathBuf> {
    let direct = dir.join(name);
    if direct.is_file() && is_preset_file(&direct) {
        return Some(direct);
    }
    PRESET_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{name}.{ext}")))
        .find(|p| p.is_file())
}

fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, ' ' | '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    match cleaned.trim_matches('.') {
        "" => "_".to_string(),
        s => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plugin_dir_is_under_root() {
        let dir = user_presets_dir("Tape Echo");
        assert!(dir.starts_with(user_presets_root()));
        assert!(dir.ends_with("Tape Echo"));
    }

    #[test]
    fn unsafe_names_are_cleaned() {
        assert_eq!(sanitize("a/b\\c"), "a_b_c");
        assert_eq!(sanitize(".."), "_");
        assert_eq!(sanitize("  Echo v2.0 "), "Echo v2.0");
    }

    #[test]
    fn listing_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.fxb", "a.FXP", "notes.txt", "c.fxp"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("d.fxp")).unwrap();

        let names: Vec<_> = list_preset_files(dir.path())
            .iter()
            .filter_map(|p| p.file_name()?.to_str().map(str::to_string))
            .collect();
        assert_eq!(names, ["a.FXP", "b.fxb", "c.fxp"]);
        assert!(list_preset_files(&dir.path().join("missing")).is_empty());
    }

    #[test]
    fn find_tries_extensions() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Lead.fxp"), b"x").unwrap();
        std::fs::write(dir.path().join("Factory.fxb"), b"x").unwrap();

        assert_eq!(find_preset_in(dir.path(), "Lead"), Some(dir.path().join("Lead.fxp")));
        assert_eq!(
            find_preset_in(dir.path(), "Factory.fxb"),
            Some(dir.path().join("Factory.fxb"))
        );
        assert_eq!(find_preset_in(dir.path(), "Missing"), None);
    }

    #[test]
    fn ensure_creates_nested_dir() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("x").join("y");
        ensure_dir(&dir).unwrap();
        assert!(dir.is_dir());
        ensure_dir(&dir).unwrap();
    }
}
