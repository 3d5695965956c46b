//! Configuration module
//!
//! Handles loading and saving the daemon configuration from TOML files.
//! This is the install layout (binaries, service directories, bus files);
//! the user-facing settings live on the bus.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, warn};

pub mod toml_config;

/// Daemon configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// tailscale CLI binary
    pub tailscale_binary: String,

    /// daemontools service directory of the tailscale backend
    pub backend_service: String,

    /// daemontools service directory of this daemon
    pub control_service: String,

    pub svstat_binary: String,
    pub svc_binary: String,
    pub sysctl_binary: String,

    /// Settings written by the GUI (TOML)
    pub settings_file: PathBuf,

    /// Status published every cycle (JSON)
    pub status_file: PathBuf,

    /// GUI command slot
    pub command_file: PathBuf,

    /// First line holds the installed package version
    pub version_file: PathBuf,

    /// Settings file of older releases, migrated on startup
    pub legacy_settings_file: PathBuf,

    /// tailscale state directory of older releases
    pub legacy_state_dir: PathBuf,

    /// tailscale state directory used by stock firmware
    pub state_dir: PathBuf,

    /// Present when the firmware ships its own tailscale integration
    pub stock_install_dir: PathBuf,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            tailscale_binary: "/data/TailscaleGX/tailscale".to_string(),
            backend_service: "/service/TailscaleGX-backend".to_string(),
            control_service: "/service/TailscaleGX-control".to_string(),
            svstat_binary: "svstat".to_string(),
            svc_binary: "svc".to_string(),
            sysctl_binary: "sysctl".to_string(),
            settings_file: PathBuf::from("/data/conf/tsgx/settings.toml"),
            status_file: PathBuf::from("/run/tsgx/status.json"),
            command_file: PathBuf::from("/run/tsgx/command"),
            version_file: PathBuf::from("/etc/venus/installedVersion-TailscaleGX"),
            legacy_settings_file: PathBuf::from("/data/setupOptions/TailscaleGX/settings.toml"),
            legacy_state_dir: PathBuf::from("/data/setupOptions/TailscaleGX/state"),
            state_dir: PathBuf::from("/data/conf/tailscale"),
            stock_install_dir: PathBuf::from("/opt/victronenergy/tailscale"),
        }
    }
}

impl DaemonConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        let strings = [
            ("tailscale_binary", &self.tailscale_binary),
            ("backend_service", &self.backend_service),
            ("control_service", &self.control_service),
            ("svstat_binary", &self.svstat_binary),
            ("svc_binary", &self.svc_binary),
            ("sysctl_binary", &self.sysctl_binary),
        ];
        for (field, value) in strings {
            if value.trim().is_empty() {
                return Err(format!("{} cannot be empty", field));
            }
        }

        let paths = [
            ("settings_file", &self.settings_file),
            ("status_file", &self.status_file),
            ("command_file", &self.command_file),
        ];
        for (field, value) in paths {
            if value.as_os_str().is_empty() {
                return Err(format!("{} cannot be empty", field));
            }
        }

        if self.status_file == self.settings_file || self.command_file == self.settings_file {
            return Err("status and command files must differ from the settings file".to_string());
        }

        Ok(())
    }

    /// Tailscale binary to run
    ///
    /// Falls back to `tailscale` on `PATH` when the configured binary is
    /// missing, e.g. on development machines.
    pub fn resolve_tailscale_binary(&self) -> String {
        let configured = PathBuf::from(&self.tailscale_binary);
        if configured.exists() {
            return self.tailscale_binary.clone();
        }

        match which::which("tailscale") {
            Ok(found) => {
                debug!("{} not found, using {}", self.tailscale_binary, found.display());
                found.to_string_lossy().to_string()
            }
            Err(_) => {
                warn!("tailscale binary {} not found", self.tailscale_binary);
                self.tailscale_binary.clone()
            }
        }
    }
}
