//! Live Session
//!
//! Session backed by an agent loaded into a running process.

use super::agent::{Agent, Device, DeviceError, Target};
use super::traits::{RegionIter, Session};
use crate::error::{Error, Result};
use crate::model::{MemoryBlock, MemoryRange};
use crate::transfer::{ChunkedReader, TransferConfig};

use std::collections::HashMap;
use std::time::Instant;

/// Protection filter used by [`LiveSession::capture`] unless told otherwise
pub const DEFAULT_CAPTURE_PROTECTION: &str = "r--";

/// Memory of a running process, reached through a device's agent
pub struct LiveSession<D: Device> {
    device: D,
    reader: ChunkedReader,
    agents: HashMap<Target, Box<dyn Agent>>,
    /// Target that reads and enumeration go to
    current: Option<Target>,
}

impl<D: Device> LiveSession<D> {
    pub fn new(device: D, config: TransferConfig) -> Self {
        tracing::info!(
            "Live session codec={} max_chunk={:#x}",
            config.codec(),
            config.max_chunk()
        );
        LiveSession {
            device,
            reader: ChunkedReader::new(config),
            agents: HashMap::new(),
            current: None,
        }
    }

    pub fn config(&self) -> TransferConfig {
        self.reader.config()
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn is_attached(&self) -> bool {
        self.current.is_some()
    }

    /// Attach to a process by pid or name.
    ///
    /// A name that is not running is spawned and the new pid attached.
    /// Attaching again to a target this session already holds makes it current
    /// again without going back to the device.
    pub fn attach(&mut self, target: &str) -> Result<()> {
        let target = Target::parse(target);
        let already = self.agents.contains_key(&target);
        tracing::info!("Attach {} (already attached: {})", target, already);

        if already {
            self.current = Some(target);
            return Ok(());
        }

        match self.device.enable_spawn_gating() {
            Ok(()) => tracing::info!("Enabled spawn gating"),
            Err(DeviceError::ServerNotRunning(msg)) => {
                tracing::error!("Server not running: {}", msg);
                return Err(Error::AttachFailure(format!("server not running: {}", msg)));
            }
            Err(e) => tracing::warn!("Spawn gating: {}", e),
        }

        let mut agent = match self.device.attach(&target) {
            Ok(agent) => agent,
            Err(DeviceError::ProcessNotFound(msg)) => {
                tracing::error!("{}", msg);
                self.spawn_and_attach(&target)?
            }
            Err(e) => {
                tracing::error!("{}", e);
                return Err(Error::AttachFailure(e.to_string()));
            }
        };

        agent.init_config(self.reader.config().codec())?;

        self.agents.insert(target.clone(), agent);
        self.current = Some(target);
        Ok(())
    }

    fn spawn_and_attach(&self, target: &Target) -> Result<Box<dyn Agent>> {
        let Target::Name(program) = target else {
            return Err(Error::AttachFailure(format!("process {} not found", target)));
        };

        tracing::info!("Trying to spawn {}", program);
        let pid = self
            .device
            .spawn(program)
            .map_err(|e| Error::AttachFailure(format!("spawn {}: {}", program, e)))?;

        self.device
            .attach(&Target::Pid(pid))
            .map_err(|e| Error::AttachFailure(format!("attach spawned pid {}: {}", pid, e)))
    }

    /// Record that the agent went away
    pub fn on_detached(&self, reason: &str) {
        tracing::info!("Session is detached due to: {}", reason);
    }

    /// Drop every agent and forget every attached target
    pub fn detach(&mut self) {
        self.current = None;
        if !self.agents.is_empty() {
            self.agents.clear();
            self.on_detached("detach requested");
        }
    }

    fn agent(&self) -> Result<&dyn Agent> {
        self.current
            .as_ref()
            .and_then(|target| self.agents.get(target))
            .map(|agent| &**agent)
            .ok_or(Error::NotAttached)
    }

    /// Attach to `target` and read every range matching `protection`
    pub fn capture(&mut self, target: &str, protection: &str) -> Result<Vec<MemoryBlock>> {
        tracing::debug!("Capture {} protection={}", target, protection);
        self.attach(target)?;

        let start = Instant::now();
        let ranges: Vec<MemoryRange> = self.enumerate_regions(Some(protection))?.collect();
        let mut blocks = Vec::with_capacity(ranges.len());

        for range in ranges {
            tracing::info!("{}", range);
            let bytes = self.read_at(range.base(), range.size())?;
            tracing::debug!("Captured {:#x} bytes", bytes.len());

            if (bytes.len() as u64) < range.size() {
                tracing::warn!(
                    "Partial capture of {:#x}: {:#x} of {:#x} bytes",
                    range.base(),
                    bytes.len(),
                    range.size()
                );
            }
            blocks.push(MemoryBlock::from_bytes(range, bytes));
        }

        tracing::info!(
            "Captured {} ranges in {:.3?}",
            blocks.len(),
            start.elapsed()
        );
        Ok(blocks)
    }
}

impl<D: Device> Session for LiveSession<D> {
    fn enumerate_regions(&self, protection: Option<&str>) -> Result<RegionIter<'_>> {
        let filter = protection.unwrap_or("---");
        tracing::info!("Enumerate ranges protection={}", filter);

        let ranges = self
            .agent()?
            .enumerate_ranges(filter)?
            .into_iter()
            .map(|r| r.into_range())
            .collect::<Result<Vec<_>>>()?;

        Ok(Box::new(ranges.into_iter()))
    }

    fn read_at(&self, address: u64, size: u64) -> Result<Vec<u8>> {
        tracing::debug!("Live read {:#x} {:#x}", address, size);
        let agent = self.agent()?;
        self.reader
            .read(address, size, |base, len| agent.read_memory(base, len))
    }

    fn is_live(&self) -> bool {
        true
    }
}
