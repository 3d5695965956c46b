//! File-backed settings/status bus
//!
//! - settings: TOML, written by the GUI (or by hand)
//! - status: JSON, rewritten atomically every cycle
//! - command slot: plain text, moved aside and removed once read

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::bus::{PublishedStatus, Settings, SettingsBus};
use crate::error::BusError;
use crate::types::{AuthKey, GuiCommand};

/// On-disk form of [`Settings`]
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsFile {
    pub enabled: bool,
    pub custom_arguments: String,
    pub auth_key: String,
    pub system_name: Option<String>,
}

impl SettingsFile {
    /// Load from `path`; a missing file gives the defaults
    pub fn load(path: &Path) -> Result<Self, BusError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(BusError::ReadFailed {
                    what: "settings",
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })
            }
        };

        toml::from_str(&contents).map_err(|e| BusError::MalformedSettings {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), BusError> {
        let contents = toml::to_string_pretty(self).map_err(|e| BusError::WriteFailed {
            what: "settings",
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        write_atomic(path, contents.as_bytes(), "settings")
    }
}

impl From<SettingsFile> for Settings {
    fn from(file: SettingsFile) -> Self {
        Self {
            enabled: file.enabled,
            custom_arguments: file.custom_arguments,
            auth_key: AuthKey::new(file.auth_key),
            system_name: file.system_name,
        }
    }
}

/// Status file contents: the published values plus a timestamp
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusRecord {
    #[serde(flatten)]
    pub status: PublishedStatus,
    /// RFC 3339 time of the write
    pub updated_at: String,
}

/// Bus backed by three files
#[derive(Debug, Clone)]
pub struct FileBus {
    settings_path: PathBuf,
    status_path: PathBuf,
    command_path: PathBuf,
}

impl FileBus {
    pub fn new(
        settings_path: impl Into<PathBuf>,
        status_path: impl Into<PathBuf>,
        command_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            settings_path: settings_path.into(),
            status_path: status_path.into(),
            command_path: command_path.into(),
        }
    }

    /// Last published status, `None` if the daemon never wrote one
    pub fn read_status(&self) -> Result<Option<StatusRecord>, BusError> {
        let contents = match fs::read_to_string(&self.status_path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(BusError::ReadFailed {
                    what: "status",
                    path: self.status_path.display().to_string(),
                    reason: e.to_string(),
                })
            }
        };

        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|e| BusError::ReadFailed {
                what: "status",
                path: self.status_path.display().to_string(),
                reason: e.to_string(),
            })
    }

    /// Post a command into the slot, as the GUI would
    pub fn post_command(&self, command: &GuiCommand) -> Result<(), BusError> {
        write_atomic(&self.command_path, command.as_str().as_bytes(), "command")
    }
}

impl SettingsBus for FileBus {
    fn read_settings(&self) -> Result<Settings, BusError> {
        SettingsFile::load(&self.settings_path).map(Settings::from)
    }

    fn take_gui_command(&self) -> Result<Option<GuiCommand>, BusError> {
        // Renaming first makes the take atomic: a command posted after
        // this point lands in a fresh slot and is seen next cycle
        let taken = with_suffix(&self.command_path, ".taken");
        match fs::rename(&self.command_path, &taken) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(BusError::ReadFailed {
                    what: "command",
                    path: self.command_path.display().to_string(),
                    reason: e.to_string(),
                })
            }
        }

        let raw = fs::read_to_string(&taken).map_err(|e| BusError::ReadFailed {
            what: "command",
            path: taken.display().to_string(),
            reason: e.to_string(),
        })?;
        let _ = fs::remove_file(&taken);

        Ok(GuiCommand::parse(&raw))
    }

    fn publish(&self, status: &PublishedStatus) -> Result<(), BusError> {
        let record = StatusRecord {
            status: status.clone(),
            updated_at: chrono::Utc::now().to_rfc3339(),
        };
        let contents = serde_json::to_vec_pretty(&record).map_err(|e| BusError::WriteFailed {
            what: "status",
            path: self.status_path.display().to_string(),
            reason: e.to_string(),
        })?;
        write_atomic(&self.status_path, &contents, "status")
    }
}

/// Write via a temporary file and rename so readers never see half a file
fn write_atomic(path: &Path, contents: &[u8], what: &'static str) -> Result<(), BusError> {
    let failed = |e: std::io::Error| BusError::WriteFailed {
        what,
        path: path.display().to_string(),
        reason: e.to_string(),
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(failed)?;
        }
    }

    let tmp = with_suffix(path, ".tmp");
    fs::write(&tmp, contents).map_err(failed)?;
    fs::rename(&tmp, path).map_err(failed)
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}
