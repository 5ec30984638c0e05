//! Plugstate CLI - inspect and build legacy preset files.

mod commands;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "plugstate")]
#[command(author, version, about = "Plugin preset file tools", long_about = None)]
struct Cli {
    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the header and program names of an .fxp or .fxb file
    Info(commands::info::InfoArgs),

    /// Load a preset file into a plugin and print its parameters
    Dump(commands::dump::DumpArgs),

    /// Write a manifest's factory presets as an .fxb bank
    CreateBank(commands::create_bank::CreateBankArgs),

    /// Export one program of a bank as an .fxp file
    Extract(commands::extract::ExtractArgs),

    /// Show where user presets for a plugin are kept
    Paths(commands::paths::PathsArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Info(args) => commands::info::run(args),
        Commands::Dump(args) => commands::dump::run(args),
        Commands::CreateBank(args) => commands::create_bank::run(args),
        Commands::Extract(args) => commands::extract::run(args),
        Commands::Paths(args) => commands::paths::run(args),
    }
}
