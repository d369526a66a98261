//! Memory Sessions
//!
//! Backend-agnostic access to process memory:
//! - Live process attachment through a `Device` and its `Agent`
//! - Captured snapshots via `SnapshotSession`
//! - Local processes via `LocalDevice`
//! - Mock devices for testing

mod agent;
mod live;
#[cfg(test)]
mod mock;
mod process;
mod snapshot;
mod traits;

pub use agent::{Agent, AgentRange, Device, DeviceError, Target};
pub use live::{LiveSession, DEFAULT_CAPTURE_PROTECTION};
pub use process::{find_process, LocalDevice, ProcessAgent};
pub use snapshot::SnapshotSession;
pub use traits::{RegionIter, Session};
