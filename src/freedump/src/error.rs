//! Error types for memory access and snapshot handling.

use std::path::PathBuf;

/// Errors from memory sessions, chunked transfers and snapshot files
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Invalid memory range: {0}")]
    InvalidRange(String),

    #[error("Invalid chunk size {0:#x}: must be between 1 and 0xffffffff")]
    InvalidChunkSize(u64),

    #[error("Short read: expected {expected} bytes, got {actual}")]
    ShortRead { expected: usize, actual: usize },

    #[error("Corrupt chunk at {base:#x}: {reason}")]
    CorruptChunk { base: u64, reason: String },

    #[error("Address {0:#x} is not inside any known range")]
    UnmappedAddress(u64),

    #[error("Failed to parse manifest {path:?}: {source}")]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Attach failed: {0}")]
    AttachFailure(String),

    #[error("Agent error: {0}")]
    Agent(String),

    #[error("No process attached")]
    NotAttached,

    #[error("Snapshot directory already exists: {0:?}")]
    DirectoryExists(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
