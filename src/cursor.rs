// src/cursor.rs

//! Little-endian reader over an in-memory byte buffer.
//!
//! `ByteCursor` is the only way the decoders touch raw bytes. Every read is
//! bounds-checked up front: a read that would run past the end fails with
//! `DecodeError::TruncatedData` and leaves the position where it was.

use crate::error::{DecodeError, DecodeResult};

/// Sequential reader over a borrowed byte slice.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current absolute offset into the buffer.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left between the current position and the end of the buffer.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Everything from the current position to the end, without advancing.
    pub fn remaining_slice(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    /// Fails with `TruncatedData` unless `n` more bytes are available.
    pub fn ensure(&self, n: usize) -> DecodeResult<()> {
        if n > self.remaining() {
            return Err(DecodeError::TruncatedData {
                offset: self.pos,
                needed: n,
                available: self.remaining(),
            });
        }
        Ok(())
    }

    /// Advances the position by `n` bytes.
    pub fn skip(&mut self, n: usize) -> DecodeResult<()> {
        self.ensure(n)?;
        self.pos += n;
        Ok(())
    }

    /// Returns the next `n` bytes without advancing.
    pub fn peek_bytes(&self, n: usize) -> DecodeResult<&'a [u8]> {
        self.ensure(n)?;
        Ok(&self.data[self.pos..self.pos + n])
    }

    /// Returns the next `n` bytes and advances past them.
    pub fn read_bytes(&mut self, n: usize) -> DecodeResult<&'a [u8]> {
        let bytes = self.peek_bytes(n)?;
        self.pos += n;
        Ok(bytes)
    }

    pub fn read_array<const N: usize>(&mut self) -> DecodeResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> DecodeResult<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    /// Reads one byte as a signed value.
    pub fn read_i8(&mut self) -> DecodeResult<i8> {
        Ok(self.read_u8()? as i8)
    }

    /// Reads a little-endian `u16`.
    pub fn read_u16(&mut self) -> DecodeResult<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_i16(&mut self) -> DecodeResult<i16> {
        Ok(i16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> DecodeResult<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_i32(&mut self) -> DecodeResult<i32> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    pub fn read_f32(&mut self) -> DecodeResult<f32> {
        Ok(f32::from_le_bytes(self.read_array()?))
    }

    /// Reads a 6-byte format tag (`RTPACK`, `RTTXTR`, `RTFONT`).
    pub fn read_tag(&mut self) -> DecodeResult<[u8; 6]> {
        self.read_array()
    }
}
