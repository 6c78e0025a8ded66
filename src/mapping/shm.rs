//! Anonymous shared memory regions
//!
//! The region is created with `shm_open` under a unique name and unlinked
//! straight away, so it has no persistent name and disappears once the last
//! descriptor and mapping are gone.

use std::ffi::CString;
use std::fs::File;
use std::io::{self, Write};
use std::os::unix::io::FromRawFd;
use std::sync::atomic::{AtomicUsize, Ordering};

use memmap2::{MmapMut, MmapOptions};
use tracing::{debug, trace, warn};

use super::Mapping;
use crate::error::{ArrayError, Result};

const NAME_PREFIX: &str = "/mmap_array";

static NAME_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn unique_name() -> String {
    format!(
        "{}.{}.{}",
        NAME_PREFIX,
        std::process::id(),
        NAME_COUNTER.fetch_add(1, Ordering::Relaxed)
    )
}

fn open_unlinked() -> io::Result<File> {
    let name = CString::new(unique_name())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let flags = libc::O_RDWR | libc::O_CREAT | libc::O_EXCL;
    // Safety: `name` is a valid NUL-terminated string
    let fd = unsafe { libc::shm_open(name.as_ptr(), flags, 0o600 as libc::c_uint) };
    if fd < 0 {
        return Err(io::Error::last_os_error());
    }
    // Safety: `fd` was just opened and nothing else owns it
    let file = unsafe { File::from_raw_fd(fd) };
    // Safety: `name` is a valid NUL-terminated string
    if unsafe { libc::shm_unlink(name.as_ptr()) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(file)
}

/// A shared read-write region backed by an unlinked POSIX shared memory object
#[derive(Debug)]
pub struct SharedMemory {
    file: File,
    map: MmapMut,
}

impl SharedMemory {
    /// Creates a region holding a copy of `data`.
    ///
    /// An empty `data` still produces a one byte region, since zero length
    /// mappings are not portable.
    pub fn new(data: &[u8]) -> Result<Self> {
        let len = data.len().max(1);
        let mut file = open_unlinked()?;
        file.write_all(data)?;
        file.set_len(len as u64)?;
        // Safety: the object is unlinked, so only this process can reach it
        let map = unsafe { MmapOptions::new().len(len).map_mut(&file)? };
        debug!(len, "acquired anonymous shared memory");
        Ok(Self { file, map })
    }

    fn remap(&mut self, new_len: usize) -> io::Result<()> {
        let old_len = self.map.len();
        if new_len > old_len {
            self.file.set_len(new_len as u64)?;
        }
        // Safety: as in `new`
        self.map = unsafe { MmapOptions::new().len(new_len).map_mut(&self.file)? };
        if new_len < old_len {
            self.file.set_len(new_len as u64)?;
        }
        Ok(())
    }
}

impl Mapping for SharedMemory {
    fn len(&self) -> usize {
        self.map.len()
    }

    fn as_bytes(&self) -> &[u8] {
        &self.map[..]
    }

    fn as_bytes_mut(&mut self) -> Result<&mut [u8]> {
        Ok(&mut self.map[..])
    }

    fn resize(&mut self, new_len: usize) -> Result<()> {
        let old_len = self.map.len();
        trace!(old_len, new_len, "resizing shared memory");
        self.remap(new_len).map_err(|source| {
            warn!(old_len, new_len, error = %source, "shared memory resize failed");
            ArrayError::Resize {
                requested: new_len,
                source,
            }
        })
    }
}

impl Drop for SharedMemory {
    fn drop(&mut self) {
        debug!(len = self.map.len(), "releasing anonymous shared memory");
    }
}
