//! Local Process Device
//!
//! Device and agent for processes on this machine, read directly through
//! the OS instead of an injected script.

use super::agent::{Agent, AgentRange, Device, DeviceError, Target};
use crate::error::{Error, Result};
use crate::model::{protection_satisfies, FileInfo};
use crate::transfer::{Codec, RawRead};

use process_memory::{CopyAddress, ProcessHandle, TryIntoProcessHandle};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::{Command, Stdio};
use sysinfo::System;

/// The local machine as an attach target
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalDevice;

impl Device for LocalDevice {
    fn enable_spawn_gating(&self) -> std::result::Result<(), DeviceError> {
        Err(DeviceError::NotSupported(
            "spawn gating is not available for local processes".to_string(),
        ))
    }

    fn attach(&self, target: &Target) -> std::result::Result<Box<dyn Agent>, DeviceError> {
        let pid = match target {
            Target::Pid(pid) => {
                if !Path::new(&format!("/proc/{}", pid)).exists() {
                    return Err(DeviceError::ProcessNotFound(format!(
                        "unable to find process with pid {}",
                        pid
                    )));
                }
                *pid
            }
            Target::Name(name) => find_process(name).ok_or_else(|| {
                DeviceError::ProcessNotFound(format!("unable to find process with name '{}'", name))
            })?,
        };

        let agent = ProcessAgent::attach(pid).map_err(|e| DeviceError::Other(e.to_string()))?;
        Ok(Box::new(agent))
    }

    fn spawn(&self, program: &str) -> std::result::Result<u32, DeviceError> {
        let mut child = Command::new(program)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| DeviceError::Other(format!("failed to spawn {}: {}", program, e)))?;
        let pid = child.id();

        // reap the child whenever it exits
        std::thread::spawn(move || match child.wait() {
            Ok(status) => tracing::info!("Spawned process {} exited: {}", pid, status),
            Err(e) => tracing::warn!("Failed to wait for spawned process {}: {}", pid, e),
        });

        Ok(pid)
    }
}

/// Agent reading a local process through `process_memory`
pub struct ProcessAgent {
    pub pid: u32,
    handle: ProcessHandle,
    codec: Codec,
}

impl ProcessAgent {
    pub fn attach(pid: u32) -> Result<Self> {
        let handle = (pid as process_memory::Pid)
            .try_into_process_handle()
            .map_err(|e| {
                Error::AttachFailure(format!(
                    "failed to open process {}: {}. Try running with sudo.",
                    pid, e
                ))
            })?;

        tracing::info!("Attached to local process {}", pid);
        Ok(ProcessAgent {
            pid,
            handle,
            codec: Codec::Raw,
        })
    }
}

impl Agent for ProcessAgent {
    fn init_config(&mut self, codec: Codec) -> Result<()> {
        tracing::debug!("Agent codec={}", codec);
        self.codec = codec;
        Ok(())
    }

    fn enumerate_ranges(&self, protection: &str) -> Result<Vec<AgentRange>> {
        let ranges = parse_maps(self.pid)?
            .into_iter()
            .filter(|entry| protection_satisfies(&entry.protection(), protection))
            .map(|entry| entry.into_agent_range())
            .collect();
        Ok(ranges)
    }

    fn read_memory(&self, base: u64, size: u32) -> RawRead {
        let mut buffer = vec![0u8; size as usize];
        match self.handle.copy_address(base as usize, &mut buffer) {
            Ok(()) => RawRead::Bytes(self.codec.encode(&buffer)),
            Err(e) => {
                tracing::debug!("Failed to read {} bytes at {:#x}: {}", size, base, e);
                RawRead::Unreadable
            }
        }
    }
}

/// One line of /proc/pid/maps
#[derive(Debug, Clone, PartialEq, Eq)]
struct MapsEntry {
    start: u64,
    end: u64,
    perms: String,
    offset: u64,
    path: Option<String>,
}

impl MapsEntry {
    /// `rw-p` -> `rw-`
    fn protection(&self) -> String {
        self.perms.chars().take(3).collect()
    }

    fn into_agent_range(self) -> AgentRange {
        let size = self.end - self.start;
        let protection = self.protection();
        // pseudo paths like [heap] and [stack] are not backing files
        let file = self
            .path
            .filter(|p| p.starts_with('/'))
            .map(|p| FileInfo::new(p, self.offset, size));

        AgentRange {
            base: format!("{:#x}", self.start),
            size,
            protection,
            file,
        }
    }
}

/// Find a running process by name, preferring the largest when several match
pub fn find_process(name: &str) -> Option<u32> {
    let mut system = System::new_all();
    system.refresh_all();

    let mut candidates: Vec<(u32, u64)> = system
        .processes()
        .values()
        .filter(|process| {
            process.name().to_string_lossy() == name
                || process
                    .exe()
                    .and_then(|exe| exe.file_name())
                    .map(|exe| exe.to_string_lossy() == name)
                    .unwrap_or(false)
        })
        .map(|process| (process.pid().as_u32(), process.memory()))
        .collect();

    candidates.sort_by(|a, b| b.1.cmp(&a.1));

    let (pid, memory) = candidates.first()?;
    tracing::info!(
        "Found process {}: PID {} (memory: {} MB)",
        name,
        pid,
        memory / 1_000_000
    );
    Some(*pid)
}

/// Parse /proc/pid/maps to get memory regions
fn parse_maps(pid: u32) -> Result<Vec<MapsEntry>> {
    let maps_path = format!("/proc/{}/maps", pid);
    let file = File::open(&maps_path).map_err(|e| {
        Error::Agent(format!(
            "failed to open {}: {}. Do you have permission?",
            maps_path, e
        ))
    })?;

    let mut entries = Vec::new();
    for line in BufReader::new(file).lines() {
        if let Some(entry) = parse_maps_line(&line?) {
            entries.push(entry);
        }
    }
    Ok(entries)
}

fn parse_maps_line(line: &str) -> Option<MapsEntry> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let (start, end) = parts.first()?.split_once('-')?;

    let start = u64::from_str_radix(start, 16).ok()?;
    let end = u64::from_str_radix(end, 16).ok()?;
    if end <= start {
        return None;
    }

    let perms = parts.get(1)?.to_string();
    let offset = parts
        .get(2)
        .and_then(|s| u64::from_str_radix(s, 16).ok())
        .unwrap_or(0);
    // paths may contain spaces
    let path = (parts.len() > 5).then(|| parts[5..].join(" "));

    Some(MapsEntry {
        start,
        end,
        perms,
        offset,
        path,
    })
}
