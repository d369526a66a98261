//! Mock Device
//!
//! An in-memory device and agent for testing live sessions.

use super::agent::{Agent, AgentRange, Device, DeviceError, Target};
use crate::error::Result;
use crate::model::protection_satisfies;
use crate::transfer::{Codec, RawRead};

use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// A fake process: a pid, a name and some mapped regions
#[derive(Debug, Clone)]
pub struct MockProcess {
    pub pid: u32,
    pub name: String,
    /// (base, bytes, protection)
    pub regions: Vec<(u64, Vec<u8>, String)>,
}

impl MockProcess {
    pub fn new(pid: u32, name: &str) -> Self {
        MockProcess {
            pid,
            name: name.to_string(),
            regions: Vec::new(),
        }
    }

    pub fn with_region(mut self, base: u64, bytes: Vec<u8>, protection: &str) -> Self {
        self.regions.push((base, bytes, protection.to_string()));
        self
    }
}

/// Device serving [`MockProcess`]es, recording every call it gets
pub struct MockDevice {
    running: RefCell<Vec<MockProcess>>,
    spawnable: Vec<MockProcess>,
    gating: std::result::Result<(), DeviceError>,
    attach_error: Option<DeviceError>,
    attach_calls: Cell<usize>,
    spawned: RefCell<Vec<String>>,
    reads: Rc<RefCell<Vec<(u64, u32)>>>,
}

impl MockDevice {
    pub fn new() -> Self {
        MockDevice {
            running: RefCell::new(Vec::new()),
            spawnable: Vec::new(),
            gating: Ok(()),
            attach_error: None,
            attach_calls: Cell::new(0),
            spawned: RefCell::new(Vec::new()),
            reads: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn with_process(self, process: MockProcess) -> Self {
        self.running.borrow_mut().push(process);
        self
    }

    /// A program that is not running but starts when spawned
    pub fn with_spawnable(mut self, process: MockProcess) -> Self {
        self.spawnable.push(process);
        self
    }

    pub fn with_gating(mut self, gating: std::result::Result<(), DeviceError>) -> Self {
        self.gating = gating;
        self
    }

    pub fn with_attach_error(mut self, error: DeviceError) -> Self {
        self.attach_error = Some(error);
        self
    }

    pub fn attach_calls(&self) -> usize {
        self.attach_calls.get()
    }

    pub fn spawned(&self) -> Vec<String> {
        self.spawned.borrow().clone()
    }

    /// Every (base, size) the agents were asked to read, in order
    pub fn read_calls(&self) -> Vec<(u64, u32)> {
        self.reads.borrow().clone()
    }
}

impl Default for MockDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl Device for MockDevice {
    fn enable_spawn_gating(&self) -> std::result::Result<(), DeviceError> {
        self.gating.clone()
    }

    fn attach(&self, target: &Target) -> std::result::Result<Box<dyn Agent>, DeviceError> {
        self.attach_calls.set(self.attach_calls.get() + 1);

        if let Some(error) = &self.attach_error {
            return Err(error.clone());
        }

        let running = self.running.borrow();
        let process = running
            .iter()
            .find(|p| match target {
                Target::Pid(pid) => p.pid == *pid,
                Target::Name(name) => &p.name == name,
            })
            .ok_or_else(|| DeviceError::ProcessNotFound(format!("unable to find {}", target)))?;

        Ok(Box::new(MockAgent {
            regions: process.regions.clone(),
            codec: Codec::Raw,
            reads: Rc::clone(&self.reads),
        }))
    }

    fn spawn(&self, program: &str) -> std::result::Result<u32, DeviceError> {
        let process = self
            .spawnable
            .iter()
            .find(|p| p.name == program)
            .ok_or_else(|| DeviceError::Other(format!("unable to spawn {}", program)))?;

        self.spawned.borrow_mut().push(program.to_string());
        self.running.borrow_mut().push(process.clone());
        Ok(process.pid)
    }
}

/// Agent answering from a [`MockProcess`]'s regions
pub struct MockAgent {
    regions: Vec<(u64, Vec<u8>, String)>,
    codec: Codec,
    reads: Rc<RefCell<Vec<(u64, u32)>>>,
}

impl Agent for MockAgent {
    fn init_config(&mut self, codec: Codec) -> Result<()> {
        self.codec = codec;
        Ok(())
    }

    fn enumerate_ranges(&self, protection: &str) -> Result<Vec<AgentRange>> {
        Ok(self
            .regions
            .iter()
            .filter(|(_, _, prot)| protection_satisfies(prot, protection))
            .map(|(base, bytes, prot)| AgentRange {
                base: format!("{:#x}", base),
                size: bytes.len() as u64,
                protection: prot.clone(),
                file: None,
            })
            .collect())
    }

    fn read_memory(&self, base: u64, size: u32) -> RawRead {
        self.reads.borrow_mut().push((base, size));

        let end = base + u64::from(size);
        self.regions
            .iter()
            .find(|(start, bytes, _)| base >= *start && end <= *start + bytes.len() as u64)
            .map(|(start, bytes, _)| {
                let offset = (base - start) as usize;
                RawRead::Bytes(self.codec.encode(&bytes[offset..offset + size as usize]))
            })
            .unwrap_or(RawRead::Unreadable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_agent_reads_inside_region_only() {
        let device =
            MockDevice::new().with_process(MockProcess::new(7, "p").with_region(0x100, vec![1, 2, 3, 4], "r--"));
        let agent = device.attach(&Target::Pid(7)).unwrap();

        assert_eq!(agent.read_memory(0x101, 2), RawRead::Bytes(vec![2, 3]));
        assert_eq!(agent.read_memory(0x102, 4), RawRead::Unreadable);
        assert_eq!(agent.read_memory(0x50, 1), RawRead::Unreadable);
        assert_eq!(device.read_calls().len(), 3);
    }

    #[test]
    fn test_mock_device_unknown_process() {
        let device = MockDevice::new();
        assert!(matches!(
            device.attach(&Target::Name("ghost".into())),
            Err(DeviceError::ProcessNotFound(_))
        ));
        assert!(device.spawn("ghost").is_err());
    }
}
