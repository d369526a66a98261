//! # freedump
//!
//! Capture the memory of a running process and read it back offline.
//!
//! This library provides functionality to:
//! - Enumerate mapped regions of a live process through an attached agent
//! - Read arbitrarily large spans through a bounded transport, optionally
//!   LZ4-framed per chunk
//! - Persist captured regions as a snapshot directory (manifest + raw files)
//! - Replay a snapshot through the same `Session` interface as a live target
//!
//! ## Example
//!
//! ```no_run
//! use freedump::{snapshot, LiveSession, LocalDevice, Session, SnapshotSession, TransferConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut live = LiveSession::new(LocalDevice, TransferConfig::default());
//! let blocks = live.capture("my-program", "r--")?;
//! let manifest = snapshot::save(&blocks, "/tmp/dumps")?;
//!
//! let replay = SnapshotSession::load(&manifest)?;
//! for range in replay.enumerate_regions(Some("rw-"))? {
//!     println!("{}", range);
//! }
//! let value = replay.read_u64(0x7f00_0000_1000)?;
//! # let _ = value;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod model;
pub mod session;
pub mod snapshot;
pub mod transfer;

#[doc(inline)]
pub use error::{Error, Result};
#[doc(inline)]
pub use model::{BlockData, FileInfo, MemoryBlock, MemoryDump, MemoryRange};
#[doc(inline)]
pub use session::{
    Agent, AgentRange, Device, DeviceError, LiveSession, LocalDevice, Session, SnapshotSession,
    Target,
};
#[doc(inline)]
pub use transfer::{ChunkedReader, Codec, RawRead, TransferConfig, DEFAULT_MAX_CHUNK};
