//! Load a preset file into a manifest-built plugin and print its values.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use plugstate_config::paths;
use plugstate_presets::PluginState;

use super::common::{FileKind, file_kind, load_plugin};

/// Print the parameters stored in an `.fxp` or `.fxb` file.
#[derive(Args)]
pub struct DumpArgs {
    /// Preset file, or the name of a preset in the plugin's user presets
    /// directory
    pub file: String,

    /// Plugin manifest (TOML)
    #[arg(short, long)]
    pub manifest: PathBuf,

    /// Print Rust source that recreates the loaded state as a preset
    #[arg(long)]
    pub source: bool,
}

/// Run the dump command.
pub fn run(args: DumpArgs) -> anyhow::Result<()> {
    let state = load_plugin(&args.manifest)?;
    let path = paths::find_preset(&state.info().name, &args.file).with_context(|| {
        format!(
            "no preset file '{}' (also looked in {})",
            args.file,
            paths::user_presets_dir(&state.info().name).display()
        )
    })?;
    let bytes = std::fs::read(&path)?;

    match file_kind(&bytes)? {
        FileKind::Program => state.load_program_fxp(&bytes)?,
        FileKind::Bank => {
            state.load_bank_fxb(&bytes)?;
            print_bank(&state);
        }
    }

    if args.source {
        print!("{}", state.dump_preset_source());
        return Ok(());
    }

    println!("{} ({})", state.info().name, path.display());
    println!("{}", "=".repeat(60));
    print_params(&state);
    Ok(())
}

fn print_bank(state: &PluginState) {
    let current = state.current_preset_index();
    println!("Presets:");
    state.with_bank(|bank| {
        for (i, preset) in bank.iter().enumerate() {
            let marker = if Some(i) == current { '*' } else { ' ' };
            let empty = if preset.is_initialized() { "" } else { " (empty)" };
            println!("  {marker}{i:>3}  {}{empty}", preset.name);
        }
    });
    println!();
}

fn print_params(state: &PluginState) {
    let table = state.table();
    let values = table.snapshot();
    println!("  {:<20} {:>14} {:>10}", "Parameter", "Value", "Norm");
    println!("  {}", "-".repeat(46));
    for (desc, &value) in table.descriptors().iter().zip(&values) {
        println!(
            "  {:<20} {:>14} {:>10.4}",
            desc.name,
            desc.format_value(value),
            desc.normalize(value)
        );
    }
}
