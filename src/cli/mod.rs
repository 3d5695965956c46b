//! CLI command implementations
//!
//! This module contains the implementation of all CLI subcommands.

use tsgx_core::bus::FileBus;
use tsgx_core::config::DaemonConfig;

pub mod logout;
pub mod run;
pub mod status;

/// Bus files named by the daemon configuration
fn file_bus(config: &DaemonConfig) -> FileBus {
    FileBus::new(
        &config.settings_file,
        &config.status_file,
        &config.command_file,
    )
}
