//! Dump command handler
//!
//! Captures every matching range of a live process into a new snapshot.

use anyhow::{bail, Context, Result};
use freedump::{snapshot, Device, LiveSession, LocalDevice, TransferConfig};
use std::path::{Path, PathBuf};

/// Handle the dump command against a local process
pub fn handle(
    process: &str,
    output: &Path,
    transfer: TransferConfig,
    protection: &str,
) -> Result<PathBuf> {
    let mut session = LiveSession::new(LocalDevice, transfer);
    let manifest = capture_to(&mut session, process, output, protection)?;

    println!("Snapshot written to {}", display_dir(&manifest).display());
    println!("Read it with: freedump read -i {} -a <address>", manifest.display());
    Ok(manifest)
}

/// Capture `process` and save it under `output`, returning the manifest path
pub fn capture_to<D: Device>(
    session: &mut LiveSession<D>,
    process: &str,
    output: &Path,
    protection: &str,
) -> Result<PathBuf> {
    let blocks = session
        .capture(process, protection)
        .with_context(|| format!("Failed to capture {}", process))?;

    if blocks.is_empty() {
        bail!("No ranges of {} match protection {}", process, protection);
    }

    let total: u64 = blocks.iter().map(|b| b.range.size()).sum();
    tracing::info!("Saving {} ranges ({:#x} bytes)", blocks.len(), total);

    snapshot::save(&blocks, output)
        .with_context(|| format!("Failed to save snapshot under {}", output.display()))
}

fn display_dir(manifest: &Path) -> &Path {
    manifest.parent().unwrap_or(manifest)
}
