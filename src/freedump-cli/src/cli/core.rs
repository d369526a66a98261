//! Core CLI definitions

use clap::{Parser, Subcommand};
use freedump::model::parse_u64;
use freedump::Codec;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "freedump")]
#[command(about = "Dump process memory and read it back offline", long_about = None)]
pub struct Cli {
    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Capture the memory of a process into a snapshot directory
    #[command(visible_alias = "d")]
    Dump {
        /// Process name or pid (a name that is not running is spawned)
        #[arg(short, long)]
        process: String,

        /// Directory the timestamped snapshot is created in
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Maximum bytes per transfer (hex or decimal)
        #[arg(short = 's', long, value_parser = parse_number)]
        transfer_size: Option<u64>,

        /// Chunk framing: raw or lz4
        #[arg(short, long)]
        codec: Option<Codec>,

        /// Capture ranges granting at least these permissions
        #[arg(long, default_value = freedump::session::DEFAULT_CAPTURE_PROTECTION)]
        protection: String,
    },

    /// Read bytes from a snapshot
    #[command(visible_alias = "r")]
    Read {
        /// Path to the snapshot's info.freedump
        #[arg(short, long)]
        info: PathBuf,

        /// Address to read (hex or decimal)
        #[arg(short, long, value_parser = parse_number)]
        address: u64,

        /// Number of bytes (hex or decimal)
        #[arg(short, long, value_parser = parse_number, default_value = "256")]
        size: u64,
    },

    /// Read bytes from a running process
    Remote {
        /// Process name or pid
        #[arg(short, long)]
        process: String,

        /// Address to read (hex or decimal)
        #[arg(short, long, value_parser = parse_number)]
        address: u64,

        /// Number of bytes (hex or decimal)
        #[arg(short, long, value_parser = parse_number, default_value = "256")]
        size: u64,

        /// Chunk framing: raw or lz4
        #[arg(short, long)]
        codec: Option<Codec>,
    },

    /// List the ranges of a snapshot or a running process
    Ranges {
        /// Path to the snapshot's info.freedump
        #[arg(short, long, conflicts_with = "process", required_unless_present = "process")]
        info: Option<PathBuf>,

        /// Process name or pid
        #[arg(short, long)]
        process: Option<String>,

        /// Protection filter ("rw-"); exact for snapshots, at-least for processes
        #[arg(long)]
        protection: Option<String>,
    },

    /// Configure default settings
    #[command(visible_alias = "c")]
    Configure {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Default maximum bytes per transfer (hex or decimal)
        #[arg(long, value_parser = parse_number)]
        transfer_size: Option<u64>,

        /// Default chunk framing: raw or lz4
        #[arg(long)]
        codec: Option<Codec>,

        /// Default directory for new snapshots
        #[arg(long)]
        output_directory: Option<PathBuf>,
    },
}

/// `0x`-prefixed hex or decimal
fn parse_number(value: &str) -> Result<u64, String> {
    parse_u64(value).ok_or_else(|| format!("invalid number: {}", value))
}
