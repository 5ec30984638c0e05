//! Single-program container.

use std::io::{Read, Write};

use plugstate_core::StateError;

use super::{
    FxReader, FxWrite, PROGRAM_CHUNK, PROGRAM_NAME_LEN, PROGRAM_PARAMS, decode_name, encode_name,
};
use crate::error::PresetError;

/// Program body.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgramBody {
    /// `FxCk`: one normalized value per parameter.
    Params(Vec<f32>),
    /// `FPCh`: opaque plugin chunk.
    Chunk(Vec<u8>),
}

/// Parsed `.fxp` file.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramFile {
    /// Container format version (1 for files written here).
    pub format_version: u32,
    /// Plugin unique id.
    pub unique_id: u32,
    /// Plugin version code.
    pub plugin_version: u32,
    /// Parameter count as declared in the header.
    pub num_params: u32,
    /// Program name.
    pub name: String,
    /// Values or chunk.
    pub body: ProgramBody,
}

impl ProgramFile {
    /// Parameter-list program. The declared count follows `values`.
    pub fn from_params(
        unique_id: u32,
        plugin_version: u32,
        name: impl Into<String>,
        values: Vec<f32>,
    ) -> Self {
        Self {
            format_version: 1,
            unique_id,
            plugin_version,
            num_params: values.len() as u32,
            name: name.into(),
            body: ProgramBody::Params(values),
        }
    }

    /// Opaque-chunk program.
    pub fn from_chunk(
        unique_id: u32,
        plugin_version: u32,
        num_params: u32,
        name: impl Into<String>,
        chunk: Vec<u8>,
    ) -> Self {
        Self {
            format_version: 1,
            unique_id,
            plugin_version,
            num_params,
            name: name.into(),
            body: ProgramBody::Chunk(chunk),
        }
    }

    /// Parse a complete `.fxp` image.
    pub fn read(data: &[u8]) -> Result<Self, StateError> {
        let mut reader = FxReader::new(data);
        let program = Self::parse(&mut reader)?;
        reader.finish()?;
        Ok(program)
    }

    /// Serialize to a complete `.fxp` image.
    pub fn write(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.encode(&mut out);
        out
    }

    /// Read a whole `.fxp` stream.
    pub fn read_from(mut reader: impl Read) -> Result<Self, PresetError> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Ok(Self::read(&data)?)
    }

    /// Write the `.fxp` image to a stream.
    pub fn write_to(&self, mut writer: impl Write) -> Result<(), PresetError> {
        writer.write_all(&self.write())?;
        Ok(())
    }

    /// Size of the encoded image in bytes.
    pub fn encoded_len(&self) -> usize {
        let body = match &self.body {
            ProgramBody::Params(values) => values.len() * 4,
            ProgramBody::Chunk(chunk) => 4 + chunk.len(),
        };
        56 + body
    }

    pub(super) fn parse(outer: &mut FxReader<'_>) -> Result<Self, StateError> {
        let mut r = outer.container()?;
        let kind = r.read_array()?;
        let format_version = r.read_u32()?;
        let unique_id = r.read_u32()?;
        let plugin_version = r.read_u32()?;
        let num_params = r.read_u32()?;
        let name = decode_name(r.read_bytes(PROGRAM_NAME_LEN)?);

        let body = match kind {
            PROGRAM_PARAMS => {
                // Four bytes per value must fit in what is left.
                if num_params as usize > r.remaining() / 4 {
                    return Err(StateError::format(format!(
                        "program declares {num_params} parameters, {} bytes left",
                        r.remaining()
                    )));
                }
                let values = (0..num_params)
                    .map(|_| r.read_f32())
                    .collect::<Result<Vec<_>, _>>()?;
                ProgramBody::Params(values)
            }
            PROGRAM_CHUNK => ProgramBody::Chunk(r.read_sized()?),
            other => {
                return Err(StateError::format(format!(
                    "unknown program kind {:?}",
                    String::from_utf8_lossy(&other)
                )));
            }
        };
        r.finish()?;

        Ok(Self {
            format_version,
            unique_id,
            plugin_version,
            num_params,
            name,
            body,
        })
    }

    pub(super) fn encode(&self, out: &mut Vec<u8>) {
        out.put_container(|out| {
            let kind = match self.body {
                ProgramBody::Params(_) => PROGRAM_PARAMS,
                ProgramBody::Chunk(_) => PROGRAM_CHUNK,
            };
            out.extend_from_slice(&kind);
            out.put_u32_be(self.format_version);
            out.put_u32_be(self.unique_id);
            out.put_u32_be(self.plugin_version);
            out.put_u32_be(self.num_params);
            encode_name(&self.name, out);
            match &self.body {
                ProgramBody::Params(values) => {
                    for &v in values {
                        out.put_f32_be(v);
                    }
                }
                ProgramBody::Chunk(chunk) => out.put_sized(chunk),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::legacy::fourcc;

    #[test]
    fn params_layout_matches_fxp() {
        let program =
            ProgramFile::from_params(fourcc(*b"TpEc"), 0x0001_0000, "Init", vec![0.5, 1.0]);
        let bytes = program.write();

        assert_eq!(bytes.len(), 64);
        assert_eq!(program.encoded_len(), 64);
        assert_eq!(&bytes[0..4], b"CcnK");
        assert_eq!(&bytes[4..8], &56u32.to_be_bytes());
        assert_eq!(&bytes[8..12], b"FxCk");
        assert_eq!(&bytes[12..16], &1u32.to_be_bytes());
        assert_eq!(&bytes[16..20], b"TpEc");
        assert_eq!(&bytes[24..28], &2u32.to_be_bytes());
        assert_eq!(&bytes[28..32], b"Init");
        assert_eq!(bytes[32], 0);
        assert_eq!(&bytes[56..60], &0.5f32.to_be_bytes());

        assert_eq!(ProgramFile::read(&bytes).unwrap(), program);
    }

    #[test]
    fn chunk_program_round_trip() {
        let program = ProgramFile::from_chunk(1, 2, 3, "Chunky", vec![9, 8, 7]);
        let bytes = program.write();
        assert_eq!(&bytes[8..12], b"FPCh");
        assert_eq!(&bytes[56..60], &3u32.to_be_bytes());
        let back = ProgramFile::read(&bytes).unwrap();
        assert_eq!(back, program);
        assert_eq!(back.write(), bytes);
    }

    #[test]
    fn malformed_programs_are_format_mismatches() {
        let good = ProgramFile::from_params(1, 1, "P", vec![0.1, 0.2]).write();

        let mut bad_magic = good.clone();
        bad_magic[0] = b'X';
        let mut bad_kind = good.clone();
        bad_kind[8..12].copy_from_slice(b"Nope");
        let truncated = &good[..good.len() - 1];
        let mut trailing = good.clone();
        trailing.push(0);
        let mut bad_count = good.clone();
        bad_count[24..28].copy_from_slice(&1000u32.to_be_bytes());

        for bytes in [
            &bad_magic[..],
            &bad_kind[..],
            truncated,
            &trailing[..],
            &bad_count[..],
        ] {
            assert!(
                matches!(ProgramFile::read(bytes), Err(StateError::FormatMismatch(_))),
                "accepted {bytes:?}"
            );
        }
    }

    #[test]
    fn stream_helpers() {
        let program = ProgramFile::from_params(1, 1, "Stream", vec![0.25]);
        let mut sink = Vec::new();
        program.write_to(&mut sink).unwrap();
        let back = ProgramFile::read_from(sink.as_slice()).unwrap();
        assert_eq!(back, program);
    }
}
