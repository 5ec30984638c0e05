//! Write a manifest's factory presets as a bank file.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use super::common::load_plugin;

/// Build the factory bank from a manifest.
#[derive(Args)]
pub struct CreateBankArgs {
    /// Plugin manifest (TOML)
    #[arg(short, long)]
    pub manifest: PathBuf,

    /// Output .fxb path
    #[arg(short, long)]
    pub output: PathBuf,
}

/// Run the create-bank command.
pub fn run(args: CreateBankArgs) -> anyhow::Result<()> {
    let state = load_plugin(&args.manifest)?;
    state
        .save_bank_fxb_file(&args.output)
        .with_context(|| format!("failed to write bank for '{}'", state.info().name))?;

    println!(
        "Wrote {} presets to {}",
        state.preset_count(),
        args.output.display()
    );
    Ok(())
}
