//! Snapshot Session
//!
//! Session answering reads from a snapshot loaded off disk.

use super::traits::{RegionIter, Session};
use crate::error::{Error, Result};
use crate::model::MemoryBlock;
use crate::snapshot;

use std::path::Path;

/// Captured memory, read back through a snapshot manifest
#[derive(Debug)]
pub struct SnapshotSession {
    blocks: Vec<MemoryBlock>,
}

impl SnapshotSession {
    /// Load an `info.freedump` manifest; dump files are opened on first read
    pub fn load<P: AsRef<Path>>(manifest: P) -> Result<Self> {
        Ok(Self::from_blocks(snapshot::load(manifest)?))
    }

    pub fn from_blocks(blocks: Vec<MemoryBlock>) -> Self {
        SnapshotSession { blocks }
    }

    pub fn blocks(&self) -> &[MemoryBlock] {
        &self.blocks
    }

    /// First block whose range contains `address`, in manifest order
    pub fn resolve(&self, address: u64) -> Result<&MemoryBlock> {
        self.blocks
            .iter()
            .find(|block| block.range.contains(address))
            .ok_or(Error::UnmappedAddress(address))
    }
}

impl Session for SnapshotSession {
    fn enumerate_regions(&self, protection: Option<&str>) -> Result<RegionIter<'_>> {
        tracing::info!("Enumerate ranges protection={:?}", protection);

        // an empty filter selects every range
        let protection = protection.filter(|p| !p.is_empty()).map(str::to_string);
        Ok(Box::new(
            self.blocks
                .iter()
                .map(|block| &block.range)
                .filter(move |range| match &protection {
                    Some(p) => range.protection() == p.as_str(),
                    None => true,
                })
                .cloned(),
        ))
    }

    /// Unmapped addresses produce an empty result rather than an error
    fn read_at(&self, address: u64, size: u64) -> Result<Vec<u8>> {
        tracing::debug!("Snapshot read {:#x} {:#x}", address, size);

        match self.resolve(address) {
            Ok(block) => block.read(address - block.range.base(), size),
            Err(Error::UnmappedAddress(address)) => {
                tracing::error!("Seems impossible to read memory at {:#x}", address);
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    fn is_live(&self) -> bool {
        false
    }
}
