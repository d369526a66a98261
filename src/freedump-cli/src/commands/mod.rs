//! Command handlers for freedump CLI
//!
//! Each submodule handles a specific command or group of related commands.

pub mod configure;
pub mod dump;
pub mod ranges;
pub mod read;
