//! Resizable memory regions that arrays store their elements in
//!
//! A [`Mapping`] owns a block of addressable memory that can be resized in
//! place. Resizing preserves the common prefix of the old and new contents
//! but may move the block, so addresses taken before a resize must not be
//! reused after it. Dropping a mapping releases it.

use std::fmt::Debug;
use std::io;

use crate::error::{ArrayError, Result};

mod file;
#[cfg(unix)]
mod shm;

pub use file::FileMapping;
#[cfg(unix)]
pub use shm::SharedMemory;

/// A resizable, directly addressable memory region
pub trait Mapping: Debug + Send {
    /// Current length of the region in bytes
    fn len(&self) -> usize;

    /// Returns `true` if the region has no bytes
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrows the whole region
    fn as_bytes(&self) -> &[u8];

    /// Mutably borrows the whole region; fails for read-only regions
    fn as_bytes_mut(&mut self) -> Result<&mut [u8]>;

    /// Resizes the region to exactly `new_len` bytes, keeping the first
    /// `min(old, new)` bytes. The region may move.
    fn resize(&mut self, new_len: usize) -> Result<()>;

    /// Drops every byte. Regions that cannot be empty keep a single byte,
    /// which is what the default does.
    fn clear(&mut self) -> Result<()> {
        self.resize(1)
    }

    /// Returns `true` if writes to this region are rejected
    fn is_read_only(&self) -> bool {
        false
    }
}

/// A process-private region on the heap.
///
/// Storage is kept in 8-byte words so the region is aligned for every
/// element type. An optional limit makes resizes beyond it fail the same
/// way an exhausted system mapping would.
#[derive(Debug, Default)]
pub struct HeapMapping {
    words: Vec<u64>,
    len: usize,
    limit: Option<usize>,
}

fn words_for(len: usize) -> usize {
    (len + 7) / 8
}

impl HeapMapping {
    /// A zero-filled region of `len` bytes
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            words: vec![0; words_for(len)],
            len,
            limit: None,
        }
    }

    /// A region holding a copy of `data`
    #[must_use]
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut res = Self::new(data.len());
        res.bytes_mut().copy_from_slice(data);
        res
    }

    /// Caps the size this region may grow to
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        // Safety: `words` holds at least `len` initialized bytes
        unsafe { std::slice::from_raw_parts_mut(self.words.as_mut_ptr().cast::<u8>(), self.len) }
    }
}

impl Mapping for HeapMapping {
    fn len(&self) -> usize {
        self.len
    }

    fn as_bytes(&self) -> &[u8] {
        // Safety: `words` holds at least `len` initialized bytes
        unsafe { std::slice::from_raw_parts(self.words.as_ptr().cast::<u8>(), self.len) }
    }

    fn as_bytes_mut(&mut self) -> Result<&mut [u8]> {
        Ok(self.bytes_mut())
    }

    fn resize(&mut self, new_len: usize) -> Result<()> {
        let exhausted = |source: io::Error| ArrayError::Resize {
            requested: new_len,
            source,
        };
        if let Some(limit) = self.limit {
            if new_len > limit {
                return Err(exhausted(io::Error::new(
                    io::ErrorKind::OutOfMemory,
                    format!("heap mapping is limited to {} bytes", limit),
                )));
            }
        }
        if new_len < self.len {
            // Keep bytes past `len` zeroed so a later regrow reads zeroes
            self.bytes_mut()[new_len..].fill(0);
        }
        let words = words_for(new_len);
        if words > self.words.len() {
            self.words
                .try_reserve_exact(words - self.words.len())
                .map_err(|e| exhausted(io::Error::new(io::ErrorKind::OutOfMemory, e)))?;
        }
        self.words.resize(words, 0);
        self.len = new_len;
        Ok(())
    }
}
