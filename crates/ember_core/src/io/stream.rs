//! # Byte Streams
//!
//! Ordered little-endian byte streams used for component payloads, entity
//! clones and whole-world saves.
//!
//! The store never interprets these bytes. Each component decides its own
//! layout; the world only decides which components are visited and in what
//! order.

use bytemuck::{bytes_of, Pod};

use crate::ecs::{EcsError, EcsResult};

/// Growable byte stream writer.
///
/// Reuse one writer across saves with [`StreamWriter::clear`] to keep the
/// allocation.
#[derive(Clone, Debug, Default)]
pub struct StreamWriter {
    buffer: Vec<u8>,
}

impl StreamWriter {
    /// Creates an empty writer.
    #[must_use]
    pub const fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Creates an empty writer with `capacity` bytes pre-allocated.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Returns the number of bytes written.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true if no bytes have been written.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Returns the written bytes.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Consumes the writer, returning the written bytes.
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }

    /// Discards written bytes, keeping the allocation.
    #[inline]
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Writes a single byte.
    #[inline]
    pub fn write_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    /// Writes a bool as one byte (0 or 1).
    #[inline]
    pub fn write_bool(&mut self, value: bool) {
        self.write_u8(u8::from(value));
    }

    /// Writes a u32 in little-endian format.
    #[inline]
    pub fn write_u32(&mut self, value: u32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a u64 in little-endian format.
    #[inline]
    pub fn write_u64(&mut self, value: u64) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a f32 in little-endian format.
    #[inline]
    pub fn write_f32(&mut self, value: f32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a u32 length prefix followed by the UTF-8 bytes.
    pub fn write_str(&mut self, value: &str) {
        // Names and asset paths; anything near u32::MAX is a caller bug.
        let len = u32::try_from(value.len()).unwrap_or(u32::MAX);
        self.write_u32(len);
        self.buffer
            .extend_from_slice(&value.as_bytes()[..len as usize]);
    }

    /// Writes raw bytes with no length prefix.
    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Writes a Pod type directly.
    #[inline]
    pub fn write_pod<T: Pod>(&mut self, value: &T) {
        self.buffer.extend_from_slice(bytes_of(value));
    }
}

/// Cursor over a byte slice produced by [`StreamWriter`].
pub struct StreamReader<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> StreamReader<'a> {
    /// Creates a reader positioned at the start of `buffer`.
    #[must_use]
    pub const fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            position: 0,
        }
    }

    /// Returns the number of bytes consumed so far.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Returns the number of bytes remaining.
    #[inline]
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    /// Returns true once every byte has been consumed.
    #[inline]
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Reads `len` raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnexpectedEof`] if fewer than `len` bytes remain.
    pub fn read_bytes(&mut self, len: usize) -> EcsResult<&'a [u8]> {
        let remaining = self.remaining();
        if len > remaining {
            return Err(EcsError::UnexpectedEof {
                needed: len,
                remaining,
            });
        }
        let slice = &self.buffer[self.position..self.position + len];
        self.position += len;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self) -> EcsResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Reads a single byte.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnexpectedEof`] at end of stream.
    #[inline]
    pub fn read_u8(&mut self) -> EcsResult<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    /// Reads a bool written by [`StreamWriter::write_bool`].
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidFormat`] for any byte other than 0 or 1.
    pub fn read_bool(&mut self) -> EcsResult<bool> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(EcsError::InvalidFormat(format!(
                "expected bool byte, found {other}"
            ))),
        }
    }

    /// Reads a u32 in little-endian format.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnexpectedEof`] at end of stream.
    #[inline]
    pub fn read_u32(&mut self) -> EcsResult<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    /// Reads a u64 in little-endian format.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnexpectedEof`] at end of stream.
    #[inline]
    pub fn read_u64(&mut self) -> EcsResult<u64> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    /// Reads a f32 in little-endian format.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnexpectedEof`] at end of stream.
    #[inline]
    pub fn read_f32(&mut self) -> EcsResult<f32> {
        Ok(f32::from_le_bytes(self.read_array()?))
    }

    /// Reads a length-prefixed UTF-8 string.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnexpectedEof`] if the stream is truncated, or
    /// [`EcsError::InvalidUtf8`] if the bytes are not UTF-8.
    pub fn read_string(&mut self) -> EcsResult<String> {
        let len = self.read_u32()? as usize;
        let bytes = self.read_bytes(len)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| EcsError::InvalidUtf8)
    }

    /// Reads a Pod type directly.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnexpectedEof`] if the stream is truncated.
    pub fn read_pod<T: Pod>(&mut self) -> EcsResult<T> {
        let bytes = self.read_bytes(std::mem::size_of::<T>())?;
        bytemuck::try_pod_read_unaligned(bytes)
            .map_err(|err| EcsError::InvalidFormat(format!("pod read failed: {err:?}")))
    }
}
