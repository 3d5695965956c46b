//! One-time migrations from older TailscaleGX releases
//!
//! Older releases kept `Enabled`/`IpForwarding` in their own settings file
//! and the tailscale state under /data/setupOptions. Both are moved to the
//! current locations on startup.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::bus::file::SettingsFile;
use crate::bus::EXIT_NODE_ARGUMENT;
use crate::error::{BusError, TsgxError};

/// Settings layout of older releases
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct LegacySettings {
    enabled: Option<bool>,
    ip_forwarding: Option<bool>,
}

/// Fold legacy settings into the current settings file and remove them
///
/// Returns true when a legacy file was migrated.
pub fn migrate_legacy_settings(legacy_path: &Path, settings_path: &Path) -> Result<bool, TsgxError> {
    let contents = match fs::read_to_string(legacy_path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e.into()),
    };

    let legacy: LegacySettings = toml::from_str(&contents)?;
    let mut settings = SettingsFile::load(settings_path)?;

    if let Some(enabled) = legacy.enabled {
        warn!("moving enabled setting to new location and removing old location");
        settings.enabled = enabled;
    }
    if let Some(forwarding) = legacy.ip_forwarding {
        warn!("moving IP forwarding setting to new location and removing old location");
        settings.custom_arguments = if forwarding {
            EXIT_NODE_ARGUMENT.to_string()
        } else {
            String::new()
        };
    }

    settings.save(settings_path)?;
    fs::remove_file(legacy_path).map_err(|e| BusError::WriteFailed {
        what: "legacy settings",
        path: legacy_path.display().to_string(),
        reason: e.to_string(),
    })?;

    Ok(true)
}

/// Move the tailscale state directory to the stock location
///
/// Only when the old one exists and the new one does not. Returns true
/// when the directory was moved.
pub fn migrate_state_dir(legacy_dir: &Path, state_dir: &Path) -> Result<bool, TsgxError> {
    if !legacy_dir.exists() || state_dir.exists() {
        return Ok(false);
    }

    warn!("moving tailscale state to new location");
    if let Some(parent) = state_dir.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::rename(legacy_dir, state_dir)?;
    Ok(true)
}

/// True when the firmware ships tailscale itself and this daemon should
/// step aside
pub fn stock_integration_present(stock_install_dir: &Path) -> bool {
    stock_install_dir.exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_no_legacy_file() {
        let dir = tempdir().unwrap();
        let migrated = migrate_legacy_settings(
            &dir.path().join("old.toml"),
            &dir.path().join("settings.toml"),
        )
        .unwrap();
        assert!(!migrated);
        assert!(!dir.path().join("settings.toml").exists());
    }

    #[test]
    fn test_legacy_settings_are_folded_in() {
        let dir = tempdir().unwrap();
        let legacy = dir.path().join("old.toml");
        let current = dir.path().join("settings.toml");
        fs::write(&legacy, "Enabled = true\nIpForwarding = true\n").unwrap();
        fs::write(&current, "auth_key = \"tskey-keep\"\n").unwrap();

        assert!(migrate_legacy_settings(&legacy, &current).unwrap());
        assert!(!legacy.exists());

        let settings = SettingsFile::load(&current).unwrap();
        assert!(settings.enabled);
        assert_eq!(settings.custom_arguments, EXIT_NODE_ARGUMENT);
        assert_eq!(settings.auth_key, "tskey-keep");
    }

    #[test]
    fn test_state_dir_moved_once() {
        let dir = tempdir().unwrap();
        let legacy = dir.path().join("setupOptions/state");
        let stock = dir.path().join("conf/tailscale");
        fs::create_dir_all(&legacy).unwrap();
        fs::write(legacy.join("tailscaled.state"), "{}").unwrap();

        assert!(migrate_state_dir(&legacy, &stock).unwrap());
        assert!(stock.join("tailscaled.state").exists());
        assert!(!legacy.exists());

        fs::create_dir_all(&legacy).unwrap();
        assert!(!migrate_state_dir(&legacy, &stock).unwrap());
    }
}
