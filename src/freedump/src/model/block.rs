//! Captured memory blocks

use super::dump::{bounded_slice, MemoryDump};
use super::range::MemoryRange;
use crate::error::Result;

/// Content source of a block
#[derive(Debug)]
pub enum BlockData {
    /// Bytes just read from a live target
    Raw(Vec<u8>),
    /// Bytes stored in a snapshot `.dump` file
    Dump(MemoryDump),
}

impl BlockData {
    pub fn read(&self, offset: u64, size: u64) -> Result<Vec<u8>> {
        match self {
            BlockData::Raw(bytes) => Ok(bounded_slice(bytes, offset, size).to_vec()),
            BlockData::Dump(dump) => dump.read(offset, size),
        }
    }

    /// All bytes of the block, loading the dump file if needed
    pub fn bytes(&self) -> Result<&[u8]> {
        match self {
            BlockData::Raw(bytes) => Ok(bytes),
            BlockData::Dump(dump) => dump.ensure_loaded(),
        }
    }
}

/// A captured region paired with its bytes
#[derive(Debug)]
pub struct MemoryBlock {
    pub range: MemoryRange,
    pub data: BlockData,
}

impl MemoryBlock {
    pub fn from_bytes(range: MemoryRange, bytes: Vec<u8>) -> Self {
        MemoryBlock {
            range,
            data: BlockData::Raw(bytes),
        }
    }

    pub fn from_dump(range: MemoryRange, dump: MemoryDump) -> Self {
        MemoryBlock {
            range,
            data: BlockData::Dump(dump),
        }
    }

    /// Read relative to the start of the block's range
    pub fn read(&self, offset: u64, size: u64) -> Result<Vec<u8>> {
        self.data.read(offset, size)
    }

    /// Whether fewer bytes were captured than the range spans
    pub fn is_partial(&self) -> Result<bool> {
        Ok((self.data.bytes()?.len() as u64) < self.range.size())
    }
}
