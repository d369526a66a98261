//! Configuration command handlers
//!
//! Handles the `configure` subcommand for setting freedump CLI defaults.

use crate::config::Config;
use anyhow::Result;
use freedump::Codec;
use std::path::PathBuf;

/// Handle the configure command
///
/// # Arguments
/// * `show` - If true, show current configuration
/// * `transfer_size` - Default maximum bytes per transfer
/// * `codec` - Default chunk framing
/// * `output_directory` - Default snapshot directory
pub fn handle(
    show: bool,
    transfer_size: Option<u64>,
    codec: Option<Codec>,
    output_directory: Option<PathBuf>,
) -> Result<()> {
    let mut config = Config::load()?;

    if show {
        show_config(&config);
        return Ok(());
    }

    if apply(&mut config, transfer_size, codec, output_directory)? {
        config.save()?;
        println!("Configuration updated");
        if let Ok(path) = Config::config_path() {
            println!("Config saved to: {}", path.display());
        }
    } else {
        show_usage();
    }

    Ok(())
}

/// Merge the given settings into `config`, returning whether anything changed
fn apply(
    config: &mut Config,
    transfer_size: Option<u64>,
    codec: Option<Codec>,
    output_directory: Option<PathBuf>,
) -> Result<bool> {
    let changed = transfer_size.is_some() || codec.is_some() || output_directory.is_some();

    if let Some(size) = transfer_size {
        config.transfer_size = Some(size);
    }
    if let Some(codec) = codec {
        config.codec = Some(codec.to_string());
    }
    if let Some(dir) = output_directory {
        config.output_directory = Some(dir);
    }

    // merged settings must form a valid transfer config
    config.transfer(None, None)?;
    Ok(changed)
}

/// Display current configuration
fn show_config(config: &Config) {
    match config.transfer(None, None) {
        Ok(transfer) => {
            println!("Transfer size: {:#x}", transfer.max_chunk());
            println!("Codec: {}", transfer.codec());
        }
        Err(e) => println!("Invalid transfer settings: {:#}", e),
    }
    println!("Output directory: {}", config.output_directory(None).display());

    if let Ok(path) = Config::config_path() {
        println!("Config file: {}", path.display());
    }
}

/// Show usage help for the configure command
fn show_usage() {
    println!("Usage: freedump configure --transfer-size 0x100000 --codec lz4");
    println!("   or: freedump configure --output-directory /path/to/dumps");
    println!("   or: freedump configure --show");
}
