//! Memory Dump Files
//!
//! A byte source bound to one raw `.dump` file, loaded at most once.

use crate::error::Result;
use once_cell::unsync::OnceCell;
use std::fs;
use std::path::{Path, PathBuf};

/// Raw bytes of one captured range, backed by a file on disk.
///
/// Starts unopened; the first read (or [`MemoryDump::open`]) loads the whole
/// file and every later read is served from memory.
#[derive(Debug)]
pub struct MemoryDump {
    path: PathBuf,
    bytes: OnceCell<Vec<u8>>,
}

impl MemoryDump {
    /// Bind to a dump file without touching the disk
    pub fn lazy<P: AsRef<Path>>(path: P) -> Self {
        MemoryDump {
            path: path.as_ref().to_path_buf(),
            bytes: OnceCell::new(),
        }
    }

    /// Bind to a dump file and load it immediately
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let dump = Self::lazy(path);
        dump.ensure_loaded()?;
        Ok(dump)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_opened(&self) -> bool {
        self.bytes.get().is_some()
    }

    /// Load the file on first use and return the whole buffer
    pub fn ensure_loaded(&self) -> Result<&[u8]> {
        let bytes = self.bytes.get_or_try_init(|| {
            tracing::debug!("Opening memory dump {:?}", self.path);
            fs::read(&self.path)
        })?;
        Ok(bytes)
    }

    /// Read `size` bytes at `offset`, truncated at the end of the file
    pub fn read(&self, offset: u64, size: u64) -> Result<Vec<u8>> {
        tracing::debug!("Dump read {:#x} {:#x} from {:?}", offset, size, self.path);
        let bytes = self.ensure_loaded()?;
        Ok(bounded_slice(bytes, offset, size).to_vec())
    }
}

/// `data[offset..offset + size]`, clamped to the buffer
pub(crate) fn bounded_slice(data: &[u8], offset: u64, size: u64) -> &[u8] {
    let len = data.len() as u64;
    let start = offset.min(len);
    let end = offset.saturating_add(size).min(len);
    &data[start as usize..end as usize]
}
