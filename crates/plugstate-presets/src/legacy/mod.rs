//! Legacy single-preset (`.fxp`) and bank (`.fxb`) containers.
//!
//! The framing is the frozen VST2 interchange layout: every integer and float
//! is big-endian, regardless of platform. Two body kinds exist for each file:
//! a list of normalized `f32` parameter values, or an opaque chunk.
//!
//! This module is a pure codec: it validates framing and round-trips bytes.
//! Checking the plugin id and applying the contents to live state is done by
//! [`PluginState`](crate::PluginState).
//!
//! ```text
//! .fxp                                  .fxb
//! 0   "CcnK"                            0   "CcnK"
//! 4   byte size of the rest             4   byte size of the rest
//! 8   "FxCk" | "FPCh"                   8   "FxBk" | "FBCh"
//! 12  format version                    12  format version
//! 16  plugin unique id                  16  plugin unique id
//! 20  plugin version                    20  plugin version
//! 24  parameter count                   24  program count
//! 28  name, 28 bytes NUL padded         28  current program
//! 56  f32 × count | u32 size + bytes    32  124 reserved bytes
//!                                       156 programs | u32 size + bytes
//! ```

mod fxb;
mod fxp;

pub use fxb::{BankBody, BankFile};
pub use fxp::{ProgramBody, ProgramFile};

use plugstate_core::StateError;

/// Container magic shared by both file kinds.
pub const CONTAINER_MAGIC: [u8; 4] = *b"CcnK";

/// Program with a parameter list.
pub const PROGRAM_PARAMS: [u8; 4] = *b"FxCk";

/// Program with an opaque chunk.
pub const PROGRAM_CHUNK: [u8; 4] = *b"FPCh";

/// Bank of parameter-list programs.
pub const BANK_PARAMS: [u8; 4] = *b"FxBk";

/// Bank with an opaque chunk.
pub const BANK_CHUNK: [u8; 4] = *b"FBCh";

/// Bytes in the program name field.
pub const PROGRAM_NAME_LEN: usize = 28;

/// Reserved bytes at the end of a bank header.
pub const BANK_RESERVED_LEN: usize = 124;

/// Pack a four-character code into the integer form used for plugin ids.
///
/// ```rust
/// use plugstate_presets::legacy::{fourcc, fourcc_to_string};
///
/// let id = fourcc(*b"TpEc");
/// assert_eq!(id, 0x5470_4563);
/// assert_eq!(fourcc_to_string(id), "TpEc");
/// ```
pub const fn fourcc(code: [u8; 4]) -> u32 {
    u32::from_be_bytes(code)
}

/// Render a plugin id as its four characters when printable, hex otherwise.
pub fn fourcc_to_string(id: u32) -> String {
    let bytes = id.to_be_bytes();
    if bytes.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
        bytes.iter().map(|&b| char::from(b)).collect()
    } else {
        format!("{id:#010x}")
    }
}

/// Big-endian cursor over a byte slice.
struct FxReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> FxReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], StateError> {
        if n > self.remaining() {
            return Err(StateError::format(format!(
                "file truncated: needed {n} bytes at offset {}, {} left",
                self.pos,
                self.remaining()
            )));
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_array(&mut self) -> Result<[u8; 4], StateError> {
        let mut out = [0u8; 4];
        out.copy_from_slice(self.read_bytes(4)?);
        Ok(out)
    }

    fn read_u32(&mut self) -> Result<u32, StateError> {
        self.read_array().map(u32::from_be_bytes)
    }

    fn read_f32(&mut self) -> Result<f32, StateError> {
        self.read_array().map(f32::from_be_bytes)
    }

    fn expect_tag(&mut self, tag: [u8; 4]) -> Result<(), StateError> {
        let found = self.read_array()?;
        if found == tag {
            Ok(())
        } else {
            Err(StateError::format(format!(
                "expected '{}' at offset {}, found {:02x?}",
                String::from_utf8_lossy(&tag),
                self.pos - 4,
                found
            )))
        }
    }

    /// Read `CcnK` + size and return a reader limited to the container.
    fn container(&mut self) -> Result<FxReader<'a>, StateError> {
        self.expect_tag(CONTAINER_MAGIC)?;
        let size = self.read_u32()? as usize;
        if size > self.remaining() {
            return Err(StateError::format(format!(
                "container declares {size} bytes, {} available",
                self.remaining()
            )));
        }
        Ok(FxReader::new(self.read_bytes(size)?))
    }

    /// Length-prefixed opaque chunk.
    fn read_sized(&mut self) -> Result<Vec<u8>, StateError> {
        let size = self.read_u32()? as usize;
        Ok(self.read_bytes(size)?.to_vec())
    }

    fn finish(&self) -> Result<(), StateError> {
        if self.remaining() == 0 {
            Ok(())
        } else {
            Err(StateError::format(format!(
                "{} unexpected trailing bytes",
                self.remaining()
            )))
        }
    }
}

/// Big-endian writers for the container fields.
trait FxWrite {
    fn put_u32_be(&mut self, value: u32);
    fn put_f32_be(&mut self, value: f32);
    fn put_sized(&mut self, bytes: &[u8]);
    /// Write a container, patching its size field once `body` has run.
    fn put_container(&mut self, body: impl FnOnce(&mut Vec<u8>));
}

impl FxWrite for Vec<u8> {
    fn put_u32_be(&mut self, value: u32) {
        self.extend_from_slice(&value.to_be_bytes());
    }

    fn put_f32_be(&mut self, value: f32) {
        self.extend_from_slice(&value.to_be_bytes());
    }

    fn put_sized(&mut self, bytes: &[u8]) {
        self.put_u32_be(bytes.len() as u32);
        self.extend_from_slice(bytes);
    }

    fn put_container(&mut self, body: impl FnOnce(&mut Vec<u8>)) {
        self.extend_from_slice(&CONTAINER_MAGIC);
        let size_at = self.len();
        self.put_u32_be(0);
        body(self);
        let size = (self.len() - size_at - 4) as u32;
        self[size_at..size_at + 4].copy_from_slice(&size.to_be_bytes());
    }
}

/// Decode a NUL-padded name field.
fn decode_name(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}

/// Encode `name` into a fixed field, cutting on a character boundary.
fn encode_name(name: &str, out: &mut Vec<u8>) {
    let mut end = name.len().min(PROGRAM_NAME_LEN);
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    let mut field = [0u8; PROGRAM_NAME_LEN];
    field[..end].copy_from_slice(&name.as_bytes()[..end]);
    out.extend_from_slice(&field);
}
