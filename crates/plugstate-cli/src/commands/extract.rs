//! Export one program of a bank.

use std::path::PathBuf;

use anyhow::bail;
use clap::Args;

use super::common::load_plugin;

/// Extract a single program from an `.fxb` into an `.fxp`.
#[derive(Args)]
pub struct ExtractArgs {
    /// Path to the bank file
    pub bank: PathBuf,

    /// Plugin manifest (TOML)
    #[arg(short, long)]
    pub manifest: PathBuf,

    /// Program index in the bank
    #[arg(short, long)]
    pub index: usize,

    /// Output .fxp path
    #[arg(short, long)]
    pub output: PathBuf,
}

/// Run the extract command.
pub fn run(args: ExtractArgs) -> anyhow::Result<()> {
    let state = load_plugin(&args.manifest)?;
    state.load_bank_fxb_file(&args.bank)?;

    let count = state.preset_count();
    if args.index >= count {
        bail!("index {} out of range, bank has {count} programs", args.index);
    }
    if !state.restore_preset(args.index)? {
        bail!("program {} is empty", args.index);
    }
    state.save_program_fxp_file(&args.output)?;

    let name = state.preset_name(args.index).unwrap_or_default();
    println!("Extracted '{name}' to {}", args.output.display());
    Ok(())
}
