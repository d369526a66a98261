//! Chunk framing codecs
//!
//! Compressed chunks travel as `lz4 block || u32 LE uncompressed length`.

use crate::error::{Error, Result};
use byteorder::{ByteOrder, LE};
use std::fmt;
use std::str::FromStr;

/// Size of the uncompressed-length footer on compressed chunks
pub const LENGTH_FOOTER_SIZE: usize = 4;

/// How the agent frames each chunk payload
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Codec {
    /// Payload is the memory bytes as-is
    #[default]
    Raw,
    /// Payload is an LZ4 block followed by a length footer
    Lz4,
}

impl Codec {
    /// Turn one agent payload into the memory bytes of a `requested` byte chunk.
    ///
    /// Fewer bytes than requested are passed through; more is `CorruptChunk`.
    pub fn decode(self, base: u64, requested: u32, payload: Vec<u8>) -> Result<Vec<u8>> {
        match self {
            Codec::Raw => {
                if payload.len() as u64 > u64::from(requested) {
                    return Err(Error::CorruptChunk {
                        base,
                        reason: format!(
                            "payload of {} bytes for a {} byte chunk",
                            payload.len(),
                            requested
                        ),
                    });
                }
                Ok(payload)
            }
            Codec::Lz4 => decode_lz4_chunk(base, requested, &payload),
        }
    }

    /// Frame memory bytes the way an agent configured with this codec does
    pub fn encode(self, bytes: &[u8]) -> Vec<u8> {
        match self {
            Codec::Raw => bytes.to_vec(),
            Codec::Lz4 => encode_lz4_chunk(bytes),
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Codec::Raw => f.write_str("raw"),
            Codec::Lz4 => f.write_str("lz4"),
        }
    }
}

impl FromStr for Codec {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        // "1"/"2" are the numeric selectors older dump scripts pass
        match s.to_ascii_lowercase().as_str() {
            "raw" | "default" | "1" => Ok(Codec::Raw),
            "lz4" | "2" => Ok(Codec::Lz4),
            other => Err(format!("unknown codec {:?} (expected raw or lz4)", other)),
        }
    }
}

pub fn encode_lz4_chunk(bytes: &[u8]) -> Vec<u8> {
    let mut framed = lz4_flex::block::compress(bytes);
    let mut footer = [0u8; LENGTH_FOOTER_SIZE];
    LE::write_u32(&mut footer, bytes.len() as u32);
    framed.extend_from_slice(&footer);
    framed
}

pub fn decode_lz4_chunk(base: u64, requested: u32, payload: &[u8]) -> Result<Vec<u8>> {
    if payload.len() < LENGTH_FOOTER_SIZE {
        return Err(Error::CorruptChunk {
            base,
            reason: format!("payload of {} bytes has no length footer", payload.len()),
        });
    }

    let (compressed, footer) = payload.split_at(payload.len() - LENGTH_FOOTER_SIZE);
    let expected = LE::read_u32(footer);
    // checked before decompressing: the footer sizes the output buffer
    if expected > requested {
        return Err(Error::CorruptChunk {
            base,
            reason: format!(
                "footer claims {} bytes for a {} byte chunk",
                expected, requested
            ),
        });
    }
    let expected = expected as usize;

    let decompressed =
        lz4_flex::block::decompress(compressed, expected).map_err(|e| Error::CorruptChunk {
            base,
            reason: format!("lz4 block: {}", e),
        })?;

    if decompressed.len() != expected {
        return Err(Error::CorruptChunk {
            base,
            reason: format!(
                "decompressed {} bytes, footer says {}",
                decompressed.len(),
                expected
            ),
        });
    }

    Ok(decompressed)
}
