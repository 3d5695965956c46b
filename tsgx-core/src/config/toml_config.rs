//! TOML configuration file I/O
//!
//! Handles loading and saving the daemon configuration to/from TOML files.

use crate::config::DaemonConfig;
use crate::error::{ConfigError, TsgxError};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default configuration file name
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default configuration directory on GX devices
const DEFAULT_CONFIG_DIR: &str = "/data/conf/tsgx";

/// Get the configuration directory
///
/// Returns /data/conf/tsgx, or TSGX_CONFIG_DIR environment variable if set
pub fn get_config_dir() -> PathBuf {
    // Allow tests and development setups to override the directory
    if let Ok(config_dir) = std::env::var("TSGX_CONFIG_DIR") {
        return PathBuf::from(config_dir);
    }
    PathBuf::from(DEFAULT_CONFIG_DIR)
}

/// Get the default configuration file path
pub fn get_config_path() -> PathBuf {
    get_config_dir().join(CONFIG_FILE_NAME)
}

/// Load the configuration from `path`, or from the default location
///
/// A missing file is not an error: the built-in defaults match the
/// standard GX install.
pub fn load_config(path: Option<&Path>) -> Result<DaemonConfig, TsgxError> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(get_config_path);
    if !path.exists() {
        debug!("No configuration at {:?}, using defaults", path);
        return Ok(DaemonConfig::default());
    }
    load_config_from_path(&path)
}

/// Load the configuration from a specific TOML file
pub fn load_config_from_path<P: AsRef<Path>>(path: P) -> Result<DaemonConfig, TsgxError> {
    let contents = std::fs::read_to_string(&path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => TsgxError::Config(ConfigError::LoadFailed {
            path: path.as_ref().to_string_lossy().to_string(),
        }),
        _ => TsgxError::Config(ConfigError::IoError {
            message: format!("Failed to read config file: {}", e),
        }),
    })?;

    let config: DaemonConfig = toml::from_str(&contents).map_err(|e| {
        TsgxError::Config(ConfigError::IoError {
            message: format!("Failed to parse TOML: {}", e),
        })
    })?;

    config
        .validate()
        .map_err(|e| TsgxError::Config(ConfigError::ValidationError { message: e }))?;

    info!("Loaded configuration from {:?}", path.as_ref());
    Ok(config)
}

/// Save the configuration to a specific TOML file
pub fn save_config_to_path<P: AsRef<Path>>(config: &DaemonConfig, path: P) -> Result<(), TsgxError> {
    config
        .validate()
        .map_err(|e| TsgxError::Config(ConfigError::ValidationError { message: e }))?;

    if let Some(parent) = path.as_ref().parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            TsgxError::Config(ConfigError::IoError {
                message: format!("Failed to create config directory: {}", e),
            })
        })?;
    }

    let contents = toml::to_string_pretty(config)?;

    std::fs::write(&path, contents).map_err(|_e| {
        TsgxError::Config(ConfigError::SaveFailed {
            path: path.as_ref().to_string_lossy().to_string(),
        })
    })?;

    Ok(())
}
