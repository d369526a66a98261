//! Session Trait
//!
//! Core abstraction over live and captured memory.

use crate::error::{Error, Result};
use crate::model::MemoryRange;
use byteorder::{ByteOrder, LE};

/// Regions yielded by [`Session::enumerate_regions`]
pub type RegionIter<'a> = Box<dyn Iterator<Item = MemoryRange> + 'a>;

/// Trait for reading memory from a live target or a snapshot
pub trait Session {
    /// Regions matching `protection`, or every region when `None`
    fn enumerate_regions(&self, protection: Option<&str>) -> Result<RegionIter<'_>>;

    /// Read up to `size` bytes at `address`.
    ///
    /// A shorter result means part of the span could not be read.
    fn read_at(&self, address: u64, size: u64) -> Result<Vec<u8>>;

    /// Check if this session reads from a running process
    fn is_live(&self) -> bool;

    /// Read exactly `width` bytes or fail with `ShortRead`
    fn read_exact(&self, address: u64, width: usize) -> Result<Vec<u8>> {
        let bytes = self.read_at(address, width as u64)?;
        if bytes.len() < width {
            return Err(Error::ShortRead {
                expected: width,
                actual: bytes.len(),
            });
        }
        Ok(bytes)
    }

    /// Read a u64 from memory
    fn read_u64(&self, address: u64) -> Result<u64> {
        let bytes = self.read_exact(address, 8)?;
        Ok(LE::read_u64(&bytes))
    }

    /// Read a 64-bit pointer from memory
    fn read_addr64(&self, address: u64) -> Result<u64> {
        self.read_u64(address)
    }

    fn read_i32(&self, address: u64) -> Result<i32> {
        let bytes = self.read_exact(address, 4)?;
        Ok(LE::read_i32(&bytes))
    }

    fn read_u32(&self, address: u64) -> Result<u32> {
        let bytes = self.read_exact(address, 4)?;
        Ok(LE::read_u32(&bytes))
    }

    fn read_u8(&self, address: u64) -> Result<u8> {
        let bytes = self.read_exact(address, 1)?;
        Ok(bytes[0])
    }

    /// Any non-zero byte is `true`
    fn read_bool(&self, address: u64) -> Result<bool> {
        Ok(self.read_u8(address)? != 0)
    }

    /// Find the first region containing the given address
    fn find_region(&self, address: u64) -> Result<Option<MemoryRange>> {
        Ok(self.enumerate_regions(None)?.find(|r| r.contains(address)))
    }
}
