//! Range listing command handlers

use anyhow::{Context, Result};
use freedump::{LiveSession, LocalDevice, Session, SnapshotSession, TransferConfig};
use std::path::Path;

/// List the ranges recorded in a snapshot manifest
pub fn from_snapshot(info: &Path, protection: Option<&str>) -> Result<usize> {
    let session = SnapshotSession::load(info)
        .with_context(|| format!("Failed to load snapshot {}", info.display()))?;
    list(&session, protection)
}

/// List the ranges of a running local process
pub fn from_process(process: &str, protection: Option<&str>) -> Result<usize> {
    let mut session = LiveSession::new(LocalDevice, TransferConfig::default());
    session
        .attach(process)
        .with_context(|| format!("Failed to attach to {}", process))?;
    list(&session, protection)
}

/// Print each matching range, returning how many were printed
pub fn list(session: &dyn Session, protection: Option<&str>) -> Result<usize> {
    let mut count = 0;
    let mut total = 0u64;
    for range in session.enumerate_regions(protection)? {
        println!("{}", range);
        count += 1;
        total += range.size();
    }

    println!();
    println!("{} ranges, {:#x} bytes", count, total);
    Ok(count)
}
