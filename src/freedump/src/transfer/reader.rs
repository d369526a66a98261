//! Chunked Transfer Reader
//!
//! Splits a large read into bounded sub-reads against a raw primitive and
//! stitches the results back together.

use super::codec::Codec;
use crate::error::{Error, Result};

/// Largest payload the transport carries in one call (64 MiB)
pub const DEFAULT_MAX_CHUNK: u64 = 64 * 1024 * 1024;

/// Outcome of one raw read against the agent.
///
/// The agent signals an unreadable region with a distinct failure rather than
/// an empty payload, so both cases stay distinguishable here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawRead {
    Bytes(Vec<u8>),
    Unreadable,
}

/// One bounded sub-read: `size` bytes at `base`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    pub base: u64,
    pub size: u32,
}

/// Iterator over the partition of `[base, base + size)` into chunks
#[derive(Debug, Clone)]
pub struct Chunks {
    next_base: u64,
    remaining: u64,
    max_chunk: u64,
}

impl Iterator for Chunks {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        if self.remaining == 0 {
            return None;
        }
        let len = self.remaining.min(self.max_chunk);
        let chunk = Chunk {
            base: self.next_base,
            size: len as u32,
        };
        self.next_base = self.next_base.wrapping_add(len);
        self.remaining -= len;
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining.div_ceil(self.max_chunk) as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Chunks {}

/// Partition a read into `size / max_chunk` full chunks plus one trailing
/// chunk of `size % max_chunk` bytes when that is non-zero.
pub fn split(base: u64, size: u64, max_chunk: u64) -> Result<Chunks> {
    validate_chunk_size(max_chunk)?;
    Ok(Chunks {
        next_base: base,
        remaining: size,
        max_chunk,
    })
}

fn validate_chunk_size(max_chunk: u64) -> Result<()> {
    if max_chunk == 0 || max_chunk > u64::from(u32::MAX) {
        return Err(Error::InvalidChunkSize(max_chunk));
    }
    Ok(())
}

/// Transfer settings shared by a live session and its reader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferConfig {
    max_chunk: u64,
    codec: Codec,
}

impl TransferConfig {
    pub fn new(max_chunk: u64, codec: Codec) -> Result<Self> {
        validate_chunk_size(max_chunk)?;
        Ok(TransferConfig { max_chunk, codec })
    }

    pub fn max_chunk(&self) -> u64 {
        self.max_chunk
    }

    pub fn codec(&self) -> Codec {
        self.codec
    }
}

impl Default for TransferConfig {
    fn default() -> Self {
        TransferConfig {
            max_chunk: DEFAULT_MAX_CHUNK,
            codec: Codec::Raw,
        }
    }
}

/// Reads arbitrarily large spans through a bounded raw-read primitive
#[derive(Debug, Clone, Copy, Default)]
pub struct ChunkedReader {
    config: TransferConfig,
}

impl ChunkedReader {
    pub fn new(config: TransferConfig) -> Self {
        ChunkedReader { config }
    }

    pub fn config(&self) -> TransferConfig {
        self.config
    }

    /// Read `size` bytes at `base`, one chunk at a time in address order.
    ///
    /// An unreadable chunk stops the transfer: the bytes of the chunks before
    /// it are returned and the caller sees a result shorter than `size`.
    /// A compressed chunk that fails to decode is an error.
    pub fn read<F>(&self, base: u64, size: u64, mut read_raw: F) -> Result<Vec<u8>>
    where
        F: FnMut(u64, u32) -> RawRead,
    {
        let chunks = split(base, size, self.config.max_chunk)?;
        let mut data = Vec::with_capacity(size.min(self.config.max_chunk) as usize);

        for chunk in chunks {
            tracing::debug!("Chunk {:#x} {:#x}", chunk.base, chunk.size);

            match read_raw(chunk.base, chunk.size) {
                RawRead::Bytes(payload) => {
                    let bytes = self.config.codec.decode(chunk.base, chunk.size, payload)?;
                    data.extend_from_slice(&bytes);
                }
                RawRead::Unreadable => {
                    tracing::error!(
                        "Failed to read memory {:#x}:{:#x}, returning {:#x} of {:#x} bytes",
                        chunk.base,
                        chunk.size,
                        data.len(),
                        size
                    );
                    break;
                }
            }
        }

        Ok(data)
    }
}
