//! Instrumentation Agent Boundary
//!
//! Typed view of the agent running inside the target and of the device that
//! hosts it. Everything the agent reports is converted into crate types here.

use crate::error::{Error, Result};
use crate::model::{FileInfo, MemoryRange};
use crate::transfer::{Codec, RawRead};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A range exactly as the agent reports it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRange {
    /// Hex string, with or without `0x`
    pub base: String,
    pub size: u64,
    pub protection: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<FileInfo>,
}

impl AgentRange {
    pub fn into_range(self) -> Result<MemoryRange> {
        let digits = self
            .base
            .strip_prefix("0x")
            .or_else(|| self.base.strip_prefix("0X"))
            .unwrap_or(&self.base);
        let base = u64::from_str_radix(digits, 16).map_err(|_| {
            Error::InvalidRange(format!("agent reported base {:?}", self.base))
        })?;

        MemoryRange::new(
            base,
            self.size,
            &self.protection,
            self.file.unwrap_or_default(),
        )
    }
}

/// Calls exported by the agent loaded into an attached process
pub trait Agent {
    /// Configure the agent's chunk framing before any read
    fn init_config(&mut self, codec: Codec) -> Result<()>;

    /// Ranges granting at least the permissions in `protection`
    fn enumerate_ranges(&self, protection: &str) -> Result<Vec<AgentRange>>;

    /// Read one chunk; `Unreadable` when the memory cannot be read
    fn read_memory(&self, base: u64, size: u32) -> RawRead;
}

/// Failures reported by a device while attaching
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("not supported: {0}")]
    NotSupported(String),

    #[error("server not running: {0}")]
    ServerNotRunning(String),

    #[error("process not found: {0}")]
    ProcessNotFound(String),

    #[error("{0}")]
    Other(String),
}

/// Host of attachable processes
pub trait Device {
    /// Hold newly spawned processes until they are resumed
    fn enable_spawn_gating(&self) -> std::result::Result<(), DeviceError>;

    /// Attach to a process and load the agent into it
    fn attach(&self, target: &Target) -> std::result::Result<Box<dyn Agent>, DeviceError>;

    /// Launch a program, returning its pid
    fn spawn(&self, program: &str) -> std::result::Result<u32, DeviceError>;
}

/// A process to attach to, by pid or by name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    Pid(u32),
    Name(String),
}

impl Target {
    /// All-digit input is a pid, anything else a process name
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        if !input.is_empty() && input.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(pid) = input.parse() {
                return Target::Pid(pid);
            }
        }
        Target::Name(input.to_string())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Pid(pid) => write!(f, "{}", pid),
            Target::Name(name) => f.write_str(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_parse() {
        assert_eq!(Target::parse("1234"), Target::Pid(1234));
        assert_eq!(Target::parse(" 42 "), Target::Pid(42));
        assert_eq!(Target::parse("firefox"), Target::Name("firefox".into()));
        assert_eq!(Target::parse("app2"), Target::Name("app2".into()));
        assert_eq!(
            Target::parse("99999999999"),
            Target::Name("99999999999".into())
        );
    }

    #[test]
    fn test_agent_range_from_json() {
        let json = r#"[
            {"base": "0x7f0000001000", "size": 4096, "protection": "r-x",
             "file": {"path": "/usr/lib/libc.so.6", "offset": 8192, "size": 4096}},
            {"base": "55d0c0000000", "size": 8192, "protection": "rw-"}
        ]"#;
        let ranges: Vec<AgentRange> = serde_json::from_str(json).unwrap();

        let first = ranges[0].clone().into_range().unwrap();
        assert_eq!(first.base(), 0x7f00_0000_1000);
        assert_eq!(first.file().path, "/usr/lib/libc.so.6");
        assert_eq!(first.file().offset, 8192);

        let second = ranges[1].clone().into_range().unwrap();
        assert_eq!(second.base(), 0x55d0_c000_0000);
        assert!(second.file().is_anonymous());
    }

    #[test]
    fn test_agent_range_bad_base() {
        let range = AgentRange {
            base: "nothex".into(),
            size: 1,
            protection: "r--".into(),
            file: None,
        };
        assert!(matches!(range.into_range(), Err(Error::InvalidRange(_))));
    }
}
