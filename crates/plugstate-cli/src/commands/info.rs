//! Display legacy preset file headers.

use clap::Args;
use plugstate_core::PluginVersion;
use plugstate_presets::legacy::{BankBody, BankFile, ProgramBody, ProgramFile, fourcc_to_string};
use serde::Serialize;

use super::common::{LegacyFile, read_legacy};

/// Display `.fxp`/`.fxb` header fields.
#[derive(Args)]
pub struct InfoArgs {
    /// Path to the preset file
    pub file: std::path::PathBuf,

    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

/// Header summary shared by both file kinds.
#[derive(Debug, Serialize)]
struct FileInfo {
    kind: &'static str,
    format_version: u32,
    unique_id: String,
    plugin_version: String,
    /// Parameter count for programs, program count for banks.
    count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    current_program: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    chunk_size: Option<usize>,
    programs: Vec<String>,
    file_size: usize,
}

fn program_info(program: &ProgramFile, file_size: usize) -> FileInfo {
    let (kind, chunk_size) = match &program.body {
        ProgramBody::Params(_) => ("FxCk", None),
        ProgramBody::Chunk(chunk) => ("FPCh", Some(chunk.len())),
    };
    FileInfo {
        kind,
        format_version: program.format_version,
        unique_id: fourcc_to_string(program.unique_id),
        plugin_version: PluginVersion(program.plugin_version).to_string(),
        count: program.num_params,
        current_program: None,
        chunk_size,
        programs: vec![program.name.clone()],
        file_size,
    }
}

fn bank_info(bank: &BankFile, file_size: usize) -> FileInfo {
    let (kind, chunk_size, programs) = match &bank.body {
        BankBody::Programs(programs) => (
            "FxBk",
            None,
            programs.iter().map(|p| p.name.clone()).collect(),
        ),
        BankBody::Chunk(chunk) => ("FBCh", Some(chunk.len()), Vec::new()),
    };
    FileInfo {
        kind,
        format_version: bank.format_version,
        unique_id: fourcc_to_string(bank.unique_id),
        plugin_version: PluginVersion(bank.plugin_version).to_string(),
        count: bank.num_programs,
        current_program: Some(bank.current_program),
        chunk_size,
        programs,
        file_size,
    }
}

/// Run the info command.
pub fn run(args: InfoArgs) -> anyhow::Result<()> {
    let (bytes, file) = read_legacy(&args.file)?;
    let info = match &file {
        LegacyFile::Program(program) => program_info(program, bytes.len()),
        LegacyFile::Bank(bank) => bank_info(bank, bytes.len()),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("File:           {}", args.file.display());
    println!("Kind:           {}", info.kind);
    println!("Format Version: {}", info.format_version);
    println!("Plugin ID:      {}", info.unique_id);
    println!("Plugin Version: {}", info.plugin_version);
    match info.current_program {
        Some(current) => {
            println!("Programs:       {}", info.count);
            println!("Current:        {current}");
        }
        None => println!("Parameters:     {}", info.count),
    }
    if let Some(size) = info.chunk_size {
        println!("Chunk Size:     {size} bytes");
    }
    println!("File Size:      {} bytes", info.file_size);
    if !info.programs.is_empty() {
        println!();
        for (i, name) in info.programs.iter().enumerate() {
            println!("  {i:>3}  {name}");
        }
    }
    Ok(())
}
