//! Chunked memory transfer
//!
//! - `reader` - chunk partitioning and reassembly over a raw read primitive
//! - `codec` - raw and LZ4-framed chunk payloads

mod codec;
mod reader;

pub use codec::{decode_lz4_chunk, encode_lz4_chunk, Codec, LENGTH_FOOTER_SIZE};
pub use reader::{split, Chunk, ChunkedReader, Chunks, RawRead, TransferConfig, DEFAULT_MAX_CHUNK};
