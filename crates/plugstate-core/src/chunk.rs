//! Growable byte buffer with typed append and cursor-based reads.
//!
//! A [`ByteChunk`] is the unit of serialized plugin state. Writers append at
//! the tail; readers pass an explicit cursor (a byte offset) and receive the
//! cursor advanced past the value they read. A read that would run past the
//! end fails with [`StateError::OutOfRange`] and leaves the buffer alone.
//!
//! # Byte Order
//!
//! Values are stored in the **native byte order** of the build that produced
//! them. Chunks are exchanged between a plugin and the host it runs in, which
//! share an architecture. Moving chunks across architectures is not supported.
//!
//! # Example
//!
//! ```rust
//! use plugstate_core::ByteChunk;
//!
//! let mut chunk = ByteChunk::new();
//! chunk.put(0.5f64);
//! chunk.put(7u32);
//!
//! let (gain, pos) = chunk.get::<f64>(0).unwrap();
//! let (count, pos) = chunk.get::<u32>(pos).unwrap();
//! assert_eq!((gain, count, pos), (0.5, 7, 12));
//! assert!(chunk.get::<u8>(pos).is_err());
//! ```

use crate::error::StateError;

/// A fixed-size value that can be stored in a [`ByteChunk`].
pub trait ChunkValue: Copy {
    /// Encoded size in bytes.
    const SIZE: usize;

    /// Append the native-order encoding to `out`.
    fn write_to(self, out: &mut Vec<u8>);

    /// Decode from exactly [`SIZE`](Self::SIZE) bytes.
    fn read_from(bytes: &[u8]) -> Self;
}

macro_rules! impl_chunk_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ChunkValue for $ty {
                const SIZE: usize = core::mem::size_of::<$ty>();

                #[inline]
                fn write_to(self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_ne_bytes());
                }

                #[inline]
                fn read_from(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; core::mem::size_of::<$ty>()];
                    raw.copy_from_slice(bytes);
                    <$ty>::from_ne_bytes(raw)
                }
            }
        )*
    };
}

impl_chunk_value!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

impl ChunkValue for bool {
    const SIZE: usize = 1;

    #[inline]
    fn write_to(self, out: &mut Vec<u8>) {
        out.push(u8::from(self));
    }

    #[inline]
    fn read_from(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }
}

/// Ordered, growable byte buffer holding serialized state.
///
/// Appends always extend the tail. Existing bytes are only changed through
/// [`clear`](Self::clear), [`resize`](Self::resize) and
/// [`truncate`](Self::truncate).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ByteChunk {
    bytes: Vec<u8>,
}

impl ByteChunk {
    /// Create an empty chunk.
    pub fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    /// Create an empty chunk with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
        }
    }

    /// Number of bytes written.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the chunk holds no bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Borrow the raw bytes.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the chunk, returning its bytes.
    pub fn into_vec(self) -> Vec<u8> {
        self.bytes
    }

    /// Append a value and return the new length.
    pub fn put<T: ChunkValue>(&mut self, value: T) -> usize {
        value.write_to(&mut self.bytes);
        self.bytes.len()
    }

    /// Read a value at `pos`, returning it with the cursor advanced past it.
    pub fn get<T: ChunkValue>(&self, pos: usize) -> Result<(T, usize), StateError> {
        let (raw, next) = self.get_bytes(pos, T::SIZE)?;
        Ok((T::read_from(raw), next))
    }

    /// Append a byte span and return the new length.
    pub fn put_bytes(&mut self, data: &[u8]) -> usize {
        self.bytes.extend_from_slice(data);
        self.bytes.len()
    }

    /// Borrow `len` bytes starting at `pos`, returning them with the advanced
    /// cursor.
    pub fn get_bytes(&self, pos: usize, len: usize) -> Result<(&[u8], usize), StateError> {
        let end = pos
            .checked_add(len)
            .filter(|&end| end <= self.bytes.len())
            .ok_or(StateError::OutOfRange {
                pos,
                len,
                size: self.bytes.len(),
            })?;
        Ok((&self.bytes[pos..end], end))
    }

    /// Append a length-prefixed UTF-8 string (`u32` byte count, then bytes).
    pub fn put_str(&mut self, s: &str) -> usize {
        self.put(s.len() as u32);
        self.put_bytes(s.as_bytes())
    }

    /// Read a string written by [`put_str`](Self::put_str).
    ///
    /// Invalid UTF-8 is replaced rather than rejected; names written by older
    /// tools are not always clean.
    pub fn get_str(&self, pos: usize) -> Result<(String, usize), StateError> {
        let (len, pos) = self.get::<u32>(pos)?;
        let (raw, next) = self.get_bytes(pos, len as usize)?;
        Ok((String::from_utf8_lossy(raw).into_owned(), next))
    }

    /// Append the contents of another chunk and return the new length.
    pub fn put_chunk(&mut self, other: &ByteChunk) -> usize {
        self.put_bytes(&other.bytes)
    }

    /// Drop every byte. Outstanding cursors become out of range.
    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    /// Truncate or zero-extend to exactly `len` bytes.
    pub fn resize(&mut self, len: usize) {
        self.bytes.resize(len, 0);
    }

    /// Shorten to `len` bytes; no-op if already shorter.
    pub fn truncate(&mut self, len: usize) {
        self.bytes.truncate(len);
    }

    /// Byte-for-byte equality with another chunk.
    pub fn is_equal(&self, other: &ByteChunk) -> bool {
        self.bytes == other.bytes
    }
}

impl From<Vec<u8>> for ByteChunk {
    fn from(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

impl From<&[u8]> for ByteChunk {
    fn from(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
        }
    }
}

impl AsRef<[u8]> for ByteChunk {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}
