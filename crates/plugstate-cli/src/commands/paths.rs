//! Show user preset locations.

use std::path::PathBuf;

use clap::Args;
use plugstate_config::{PluginManifest, paths};

/// Print the user presets directory for a plugin.
#[derive(Args)]
pub struct PathsArgs {
    /// Plugin manifest (TOML)
    #[arg(short, long)]
    pub manifest: PathBuf,

    /// Create the directory if it does not exist
    #[arg(long)]
    pub create: bool,
}

/// Run the paths command.
pub fn run(args: PathsArgs) -> anyhow::Result<()> {
    let manifest = PluginManifest::load(&args.manifest)?;
    let dir = if args.create {
        paths::ensure_user_presets_dir(&manifest.name)?
    } else {
        paths::user_presets_dir(&manifest.name)
    };

    println!("User presets: {}", dir.display());
    let files = paths::list_preset_files(&dir);
    if files.is_empty() {
        println!("  (no preset files)");
    }
    for file in files {
        println!("  {}", file.display());
    }
    Ok(())
}
