//! Regions mapped from caller-supplied files

use std::fs::File;

use memmap2::{Mmap, MmapMut, MmapOptions};
use tracing::{debug, trace, warn};

use super::Mapping;
use crate::error::{ArrayError, Result};

#[derive(Debug)]
enum Region {
    ReadWrite(MmapMut),
    ReadOnly(Mmap),
}

/// A shared mapping of a file.
///
/// Read-write mappings resize by changing the file length; writes through the
/// mapping land in the file. Read-only mappings reject every write and resize
/// with [`ArrayError::ReadOnly`].
#[derive(Debug)]
pub struct FileMapping {
    file: File,
    region: Region,
    len: usize,
}

impl FileMapping {
    /// Maps `file` read-write. The file must have been opened for reading and
    /// writing.
    ///
    /// The file length always equals the mapping's length. An empty file
    /// still gets one mapped byte, which is never read or written.
    pub fn new(file: File) -> Result<Self> {
        let len = file.metadata()?.len() as usize;
        // Safety: the caller hands over the file and with it the promise that
        // nothing else truncates it while mapped
        let map = unsafe { MmapOptions::new().len(len.max(1)).map_mut(&file)? };
        debug!(len, "mapped file read-write");
        Ok(Self {
            file,
            region: Region::ReadWrite(map),
            len,
        })
    }

    /// Maps `file` read-only
    pub fn read_only(file: File) -> Result<Self> {
        // Safety: as in `new`
        let map = unsafe { Mmap::map(&file)? };
        let len = map.len();
        debug!(len, "mapped file read-only");
        Ok(Self {
            file,
            region: Region::ReadOnly(map),
            len,
        })
    }

    /// Writes outstanding changes back to the file
    pub fn flush(&self) -> Result<()> {
        match &self.region {
            Region::ReadWrite(map) => Ok(map.flush()?),
            Region::ReadOnly(_) => Ok(()),
        }
    }

    fn remap(&mut self, new_len: usize) -> std::io::Result<()> {
        let old_len = self.len;
        if new_len > old_len {
            self.file.set_len(new_len as u64)?;
        }
        // Safety: as in `new`
        let map = unsafe { MmapOptions::new().len(new_len.max(1)).map_mut(&self.file)? };
        self.region = Region::ReadWrite(map);
        self.len = new_len;
        if new_len < old_len {
            if let Err(error) = self.file.set_len(new_len as u64) {
                // The mapping already has the new length; only the file keeps
                // stale bytes past it
                warn!(old_len, new_len, %error, "failed to truncate mapped file");
            }
        }
        Ok(())
    }

    fn resize_to(&mut self, new_len: usize) -> Result<()> {
        if self.is_read_only() {
            return Err(ArrayError::ReadOnly);
        }
        let old_len = self.len;
        trace!(old_len, new_len, "resizing file mapping");
        self.remap(new_len).map_err(|source| {
            warn!(old_len, new_len, error = %source, "file mapping resize failed");
            ArrayError::Resize {
                requested: new_len,
                source,
            }
        })
    }
}

impl Mapping for FileMapping {
    fn len(&self) -> usize {
        self.len
    }

    fn as_bytes(&self) -> &[u8] {
        match &self.region {
            Region::ReadWrite(map) => &map[..self.len],
            Region::ReadOnly(map) => &map[..self.len],
        }
    }

    fn as_bytes_mut(&mut self) -> Result<&mut [u8]> {
        let len = self.len;
        match &mut self.region {
            Region::ReadWrite(map) => Ok(&mut map[..len]),
            Region::ReadOnly(_) => Err(ArrayError::ReadOnly),
        }
    }

    fn resize(&mut self, new_len: usize) -> Result<()> {
        self.resize_to(new_len)
    }

    fn clear(&mut self) -> Result<()> {
        self.resize_to(0)
    }

    fn is_read_only(&self) -> bool {
        matches!(self.region, Region::ReadOnly(_))
    }
}
