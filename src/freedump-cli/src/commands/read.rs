//! Memory read command handlers
//!
//! Hex dumps from a snapshot or from a running process, through the same
//! `Session` interface.

use anyhow::{Context, Result};
use freedump::{LiveSession, LocalDevice, Session, SnapshotSession, TransferConfig};
use std::fmt::Write;
use std::path::Path;

/// Handle the read command against a snapshot manifest
pub fn snapshot(info: &Path, address: u64, size: u64) -> Result<()> {
    let session = SnapshotSession::load(info)
        .with_context(|| format!("Failed to load snapshot {}", info.display()))?;
    handle_read(&session, address, size)
}

/// Handle the remote command against a local process
pub fn remote(process: &str, address: u64, size: u64, transfer: TransferConfig) -> Result<()> {
    let mut session = LiveSession::new(LocalDevice, transfer);
    session
        .attach(process)
        .with_context(|| format!("Failed to attach to {}", process))?;
    handle_read(&session, address, size)
}

/// Reads bytes from memory and displays them as a hex dump.
pub fn handle_read(session: &dyn Session, address: u64, size: u64) -> Result<()> {
    let data = session.read_at(address, size)?;

    if data.is_empty() {
        println!("Nothing readable at {:#x}", address);
        return Ok(());
    }
    if (data.len() as u64) < size {
        tracing::warn!("Short read: {:#x} of {:#x} bytes", data.len(), size);
    }

    println!("Reading {} bytes at {:#x}:", data.len(), address);
    print!("{}", hex_dump(address, &data));
    Ok(())
}

/// 16 bytes per line: address, hex split after 8 bytes, then `|ascii|`
pub fn hex_dump(address: u64, data: &[u8]) -> String {
    let mut out = String::new();
    for (i, chunk) in data.chunks(16).enumerate() {
        let _ = write!(out, "{:08x}  ", address + (i * 16) as u64);
        for j in 0..16 {
            match chunk.get(j) {
                Some(byte) => {
                    let _ = write!(out, "{:02x} ", byte);
                }
                // Pad if last line is short
                None => out.push_str("   "),
            }
            if j == 7 {
                out.push(' ');
            }
        }
        out.push_str(" |");
        for byte in chunk {
            let c = *byte as char;
            out.push(if c.is_ascii_graphic() || c == ' ' { c } else { '.' });
        }
        out.push_str("|\n");
    }
    out
}
