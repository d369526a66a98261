//! Configuration management for freedump CLI

use anyhow::{Context, Result};
use freedump::{Codec, TransferConfig, DEFAULT_MAX_CHUNK};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Snapshot directory used when neither flag nor config names one
pub const DEFAULT_OUTPUT_DIRECTORY: &str = "dumps";

#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Maximum bytes per transfer
    pub transfer_size: Option<u64>,
    /// "raw" or "lz4"
    pub codec: Option<String>,
    pub output_directory: Option<PathBuf>,
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("freedump");

        Ok(config_dir.join("config.toml"))
    }

    /// Load configuration from file, or create default if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config from {}", config_path.display()))?;

        toml::from_str(&contents).context("Failed to parse config file")
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory at {}", parent.display())
            })?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(config_path, contents)
            .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

        Ok(())
    }

    /// Configured codec, or the default when unset
    pub fn codec(&self) -> Result<Codec> {
        match &self.codec {
            Some(name) => name
                .parse::<Codec>()
                .map_err(anyhow::Error::msg)
                .context("Invalid codec in config"),
            None => Ok(Codec::default()),
        }
    }

    /// Transfer settings with command-line values taking precedence
    pub fn transfer(&self, transfer_size: Option<u64>, codec: Option<Codec>) -> Result<TransferConfig> {
        let max_chunk = transfer_size
            .or(self.transfer_size)
            .unwrap_or(DEFAULT_MAX_CHUNK);
        let codec = match codec {
            Some(codec) => codec,
            None => self.codec()?,
        };

        TransferConfig::new(max_chunk, codec).context("Invalid transfer size")
    }

    pub fn output_directory(&self, output: Option<PathBuf>) -> PathBuf {
        output
            .or_else(|| self.output_directory.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIRECTORY))
    }
}
