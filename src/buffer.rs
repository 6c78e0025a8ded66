//! A mapping plus the logical length of the data stored in it

use std::ops::Range;

use crate::error::{ArrayError, Result};
use crate::mapping::Mapping;

/// Owns a [`Mapping`] and tracks how many of its bytes are live.
///
/// Every access borrows the mapping afresh, so no address obtained before a
/// [`MappedBuffer::resize`] can be used after it.
#[derive(Debug)]
pub struct MappedBuffer {
    mapping: Box<dyn Mapping>,
    len: usize,
}

impl MappedBuffer {
    /// Wraps `mapping`, treating its first `len` bytes as live
    pub fn new(mapping: Box<dyn Mapping>, len: usize) -> Result<Self> {
        if len > mapping.len() {
            return Err(ArrayError::ByteRange {
                offset: 0,
                end: len,
                len: mapping.len(),
            });
        }
        Ok(Self { mapping, len })
    }

    /// Number of live bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no bytes are live
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of bytes currently mapped
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.mapping.len()
    }

    /// Address of the first mapped byte. Only valid until the next resize.
    #[must_use]
    pub fn base_address(&self) -> *const u8 {
        self.mapping.as_bytes().as_ptr()
    }

    /// Returns `true` if the underlying mapping rejects writes
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.mapping.is_read_only()
    }

    /// Borrows the live bytes
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.mapping.as_bytes()[..self.len]
    }

    /// Mutably borrows the live bytes
    pub fn bytes_mut(&mut self) -> Result<&mut [u8]> {
        let len = self.len;
        Ok(&mut self.mapping.as_bytes_mut()?[..len])
    }

    fn range(&self, offset: usize, len: usize) -> Result<Range<usize>> {
        match offset.checked_add(len) {
            Some(end) if end <= self.len => Ok(offset..end),
            end => Err(ArrayError::ByteRange {
                offset,
                end: end.unwrap_or(usize::MAX),
                len: self.len,
            }),
        }
    }

    /// Borrows `len` live bytes starting at `offset`
    pub fn read(&self, offset: usize, len: usize) -> Result<&[u8]> {
        let range = self.range(offset, len)?;
        Ok(&self.bytes()[range])
    }

    /// Overwrites live bytes starting at `offset` with `data`
    pub fn write(&mut self, offset: usize, data: &[u8]) -> Result<()> {
        let range = self.range(offset, data.len())?;
        self.bytes_mut()?[range].copy_from_slice(data);
        Ok(())
    }

    /// Copies `len` bytes from `src` to `dst`; the ranges may overlap.
    pub fn move_bytes(&mut self, dst: usize, src: usize, len: usize) -> Result<()> {
        let from = self.range(src, len)?;
        self.range(dst, len)?;
        if len > 0 && dst != src {
            self.bytes_mut()?.copy_within(from, dst);
        }
        Ok(())
    }

    /// Sets the live length to `new_len` bytes, keeping the common prefix.
    ///
    /// Bytes added at the end have unspecified contents. A length of zero
    /// clears the mapping, which keeps one mapped byte unless the mapping can
    /// represent an empty region. On failure the buffer is unchanged.
    pub fn resize(&mut self, new_len: usize) -> Result<()> {
        if new_len == 0 {
            self.mapping.clear()?;
        } else if new_len != self.mapping.len() {
            self.mapping.resize(new_len)?;
        }
        self.len = new_len;
        Ok(())
    }

    /// Gives back the mapping
    #[must_use]
    pub fn into_mapping(self) -> Box<dyn Mapping> {
        self.mapping
    }
}
