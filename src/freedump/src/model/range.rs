//! Memory Range Types
//!
//! Value types describing a mapped region and the file it was mapped from.

use crate::error::{Error, Result};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;

/// Backing file of a mapped region. All empty/zero for anonymous memory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub path: String,
    #[serde(deserialize_with = "deserialize_u64_any")]
    pub offset: u64,
    #[serde(deserialize_with = "deserialize_u64_any")]
    pub size: u64,
}

impl FileInfo {
    pub fn new(path: impl Into<String>, offset: u64, size: u64) -> Self {
        FileInfo {
            path: path.into(),
            offset,
            size,
        }
    }

    /// Provenance of a region with no backing file
    pub fn anonymous() -> Self {
        FileInfo::default()
    }

    pub fn is_anonymous(&self) -> bool {
        self.path.is_empty()
    }

    pub fn as_info(&self) -> FileInfo {
        self.clone()
    }
}

impl fmt::Display for FileInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_anonymous() {
            write!(f, "-")
        } else {
            write!(f, "{}+{:#x} ({:#x})", self.path, self.offset, self.size)
        }
    }
}

/// Serializable projection of a [`MemoryRange`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeInfo {
    #[serde(deserialize_with = "deserialize_u64_any")]
    pub base: u64,
    #[serde(deserialize_with = "deserialize_u64_any")]
    pub size: u64,
    pub protection: String,
    #[serde(default)]
    pub file: FileInfo,
}

/// A contiguous span of process address space with uniform protection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryRange {
    base: u64,
    size: u64,
    protection: String,
    file: FileInfo,
}

impl MemoryRange {
    /// Build a range, rejecting empty spans, spans that wrap the address
    /// space, and protection strings that are not an `rwx` triad.
    pub fn new(base: u64, size: u64, protection: &str, file: FileInfo) -> Result<Self> {
        if size == 0 {
            return Err(Error::InvalidRange(format!("empty range at {:#x}", base)));
        }
        if base.checked_add(size).is_none() {
            return Err(Error::InvalidRange(format!(
                "range {:#x}+{:#x} overflows the address space",
                base, size
            )));
        }
        validate_protection(protection)?;

        Ok(MemoryRange {
            base,
            size,
            protection: protection.to_string(),
            file,
        })
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// One past the last address of the range
    pub fn end(&self) -> u64 {
        self.base + self.size
    }

    pub fn protection(&self) -> &str {
        &self.protection
    }

    pub fn file(&self) -> &FileInfo {
        &self.file
    }

    pub fn contains(&self, address: u64) -> bool {
        address >= self.base && address < self.end()
    }

    pub fn is_readable(&self) -> bool {
        self.protection.starts_with('r')
    }

    pub fn is_writable(&self) -> bool {
        self.protection.as_bytes()[1] == b'w'
    }

    pub fn is_executable(&self) -> bool {
        self.protection.as_bytes()[2] == b'x'
    }

    pub fn as_info(&self) -> RangeInfo {
        RangeInfo {
            base: self.base,
            size: self.size,
            protection: self.protection.clone(),
            file: self.file.as_info(),
        }
    }
}

impl TryFrom<RangeInfo> for MemoryRange {
    type Error = Error;

    fn try_from(info: RangeInfo) -> Result<Self> {
        MemoryRange::new(info.base, info.size, &info.protection, info.file)
    }
}

impl fmt::Display for MemoryRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "base:{:#x} size:{:#x} protection:{} file:{}",
            self.base, self.size, self.protection, self.file
        )
    }
}

fn validate_protection(protection: &str) -> Result<()> {
    let bytes = protection.as_bytes();
    let valid = bytes.len() == 3
        && matches!(bytes[0], b'r' | b'-')
        && matches!(bytes[1], b'w' | b'-')
        && matches!(bytes[2], b'x' | b'-');

    if valid {
        Ok(())
    } else {
        Err(Error::InvalidRange(format!(
            "protection {:?} is not an rwx triad",
            protection
        )))
    }
}

/// Whether `protection` grants every permission `filter` grants.
///
/// `"---"` matches everything; `"r--"` matches `r--`, `rw-`, `r-x` and `rwx`.
pub fn protection_satisfies(protection: &str, filter: &str) -> bool {
    let granted = protection.as_bytes();
    filter
        .bytes()
        .enumerate()
        .all(|(i, wanted)| wanted == b'-' || granted.get(i) == Some(&wanted))
}

/// Parse a hex (`0x` prefixed) or decimal address string
pub fn parse_u64(value: &str) -> Option<u64> {
    let value = value.trim();
    match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => value.parse().ok(),
    }
}

/// Accepts a JSON integer or a hex/decimal string.
pub(crate) fn deserialize_u64_any<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    struct U64Visitor;

    impl<'de> de::Visitor<'de> for U64Visitor {
        type Value = u64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an unsigned integer or a hex/decimal string")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<u64, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<u64, E> {
            u64::try_from(v).map_err(|_| E::custom(format!("negative value {}", v)))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<u64, E> {
            parse_u64(v).ok_or_else(|| E::custom(format!("invalid integer string {:?}", v)))
        }
    }

    deserializer.deserialize_any(U64Visitor)
}
