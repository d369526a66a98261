//! Range & Block Model
//!
//! Plain data describing what was mapped in a process and what was captured:
//! - `MemoryRange` / `FileInfo` - a region and its backing file provenance
//! - `MemoryDump` - lazily loaded bytes of one snapshot file
//! - `MemoryBlock` - a range paired with its bytes

mod block;
mod dump;
mod range;

pub use block::{BlockData, MemoryBlock};
pub use dump::MemoryDump;
pub use range::{parse_u64, protection_satisfies, FileInfo, MemoryRange, RangeInfo};

pub(crate) use range::deserialize_u64_any;
