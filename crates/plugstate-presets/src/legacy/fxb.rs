//! Bank container.

use std::io::{Read, Write};

use plugstate_core::StateError;

use super::{BANK_CHUNK, BANK_PARAMS, BANK_RESERVED_LEN, FxReader, FxWrite};
use crate::error::PresetError;
use crate::legacy::ProgramFile;

/// Bank body.
#[derive(Debug, Clone, PartialEq)]
pub enum BankBody {
    /// `FxBk`: one parameter-list program per slot.
    Programs(Vec<ProgramFile>),
    /// `FBCh`: opaque plugin chunk holding every preset.
    Chunk(Vec<u8>),
}

/// Parsed `.fxb` file.
#[derive(Debug, Clone, PartialEq)]
pub struct BankFile {
    /// Container format version (2 for files written here).
    pub format_version: u32,
    /// Plugin unique id.
    pub unique_id: u32,
    /// Plugin version code.
    pub plugin_version: u32,
    /// Program count as declared in the header.
    pub num_programs: u32,
    /// Index of the program active when the bank was saved.
    pub current_program: u32,
    /// Programs or chunk.
    pub body: BankBody,
}

impl BankFile {
    /// Bank of parameter-list programs.
    pub fn from_programs(
        unique_id: u32,
        plugin_version: u32,
        current_program: u32,
        programs: Vec<ProgramFile>,
    ) -> Self {
        Self {
            format_version: 2,
            unique_id,
            plugin_version,
            num_programs: programs.len() as u32,
            current_program,
            body: BankBody::Programs(programs),
        }
    }

    /// Opaque-chunk bank.
    pub fn from_chunk(
        unique_id: u32,
        plugin_version: u32,
        num_programs: u32,
        current_program: u32,
        chunk: Vec<u8>,
    ) -> Self {
        Self {
            format_version: 2,
            unique_id,
            plugin_version,
            num_programs,
            current_program,
            body: BankBody::Chunk(chunk),
        }
    }

    /// Parse a complete `.fxb` image.
    pub fn read(data: &[u8]) -> Result<Self, StateError> {
        let mut outer = FxReader::new(data);
        let mut r = outer.container()?;
        outer.finish()?;

        let kind = r.read_array()?;
        let format_version = r.read_u32()?;
        let unique_id = r.read_u32()?;
        let plugin_version = r.read_u32()?;
        let num_programs = r.read_u32()?;
        let current_program = r.read_u32()?;
        r.read_bytes(BANK_RESERVED_LEN)?;

        let body = match kind {
            BANK_PARAMS => {
                // Smallest possible program container is 56 bytes.
                if num_programs as usize > r.remaining() / 56 {
                    return Err(StateError::format(format!(
                        "bank declares {num_programs} programs, {} bytes left",
                        r.remaining()
                    )));
                }
                let programs = (0..num_programs)
                    .map(|_| ProgramFile::parse(&mut r))
                    .collect::<Result<Vec<_>, _>>()?;
                BankBody::Programs(programs)
            }
            BANK_CHUNK => BankBody::Chunk(r.read_sized()?),
            other => {
                return Err(StateError::format(format!(
                    "unknown bank kind {:?}",
                    String::from_utf8_lossy(&other)
                )));
            }
        };
        r.finish()?;

        Ok(Self {
            format_version,
            unique_id,
            plugin_version,
            num_programs,
            current_program,
            body,
        })
    }

    /// Serialize to a complete `.fxb` image.
    pub fn write(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.put_container(|out| {
            let kind = match self.body {
                BankBody::Programs(_) => BANK_PARAMS,
                BankBody::Chunk(_) => BANK_CHUNK,
            };
            out.extend_from_slice(&kind);
            out.put_u32_be(self.format_version);
            out.put_u32_be(self.unique_id);
            out.put_u32_be(self.plugin_version);
            out.put_u32_be(self.num_programs);
            out.put_u32_be(self.current_program);
            out.extend_from_slice(&[0u8; BANK_RESERVED_LEN]);
            match &self.body {
                BankBody::Programs(programs) => {
                    for program in programs {
                        program.encode(out);
                    }
                }
                BankBody::Chunk(chunk) => out.put_sized(chunk),
            }
        });
        out
    }

    /// Read a whole `.fxb` stream.
    pub fn read_from(mut reader: impl Read) -> Result<Self, PresetError> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Ok(Self::read(&data)?)
    }

    /// Write the `.fxb` image to a stream.
    pub fn write_to(&self, mut writer: impl Write) -> Result<(), PresetError> {
        writer.write_all(&self.write())?;
        Ok(())
    }
}
