//! Bounds-checked reads over a raw log byte buffer.

use crate::error::{BraidError, Result};
use byteorder::{ByteOrder, NativeEndian};

/// Forward-only reader over an in-memory byte buffer.
///
/// Every read is bounds-checked and fails with
/// [`BraidError::Truncated`] carrying the offending offset.
pub(crate) struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn check(&self, len: usize) -> Result<()> {
        if self.pos + len > self.data.len() {
            return Err(BraidError::Truncated {
                offset: self.pos,
                expected: self.pos + len - self.data.len(),
            });
        }
        Ok(())
    }

    pub(crate) fn read_u32(&mut self) -> Result<u32> {
        self.check(4)?;
        let value = NativeEndian::read_u32(&self.data[self.pos..]);
        self.pos += 4;
        Ok(value)
    }

    pub(crate) fn read_u64(&mut self) -> Result<u64> {
        self.check(8)?;
        let value = NativeEndian::read_u64(&self.data[self.pos..]);
        self.pos += 8;
        Ok(value)
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8> {
        self.check(1)?;
        let value = self.data[self.pos];
        self.pos += 1;
        Ok(value)
    }

    /// Borrow the next `len` bytes and advance past them.
    pub(crate) fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        self.check(len)?;
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// Advance past `len` bytes.
    pub(crate) fn skip(&mut self, len: usize) -> Result<()> {
        self.check(len)?;
        self.pos += len;
        Ok(())
    }
}
