//! Error types for tsgx
//!
//! Only startup and CLI paths return these errors. The control cycle
//! logs failures and carries on; see `vpn::controller`.

use thiserror::Error;

/// Main error type for the tsgx application
#[derive(Error, Debug)]
pub enum TsgxError {
    /// Errors related to configuration loading/parsing
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Errors talking to the settings/status bus
    #[error("Bus error: {0}")]
    Bus(#[from] BusError),

    /// Errors running external commands
    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    /// Daemon mode setup errors
    #[error("Daemon error: {0}")]
    Daemon(String),

    /// Generic I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing errors
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration file: {path}")]
    LoadFailed { path: String },

    #[error("Failed to save configuration file: {path}")]
    SaveFailed { path: String },

    #[error("Configuration validation error: {message}")]
    ValidationError { message: String },

    #[error("I/O error: {message}")]
    IoError { message: String },
}

/// Settings/status bus errors
#[derive(Error, Debug)]
pub enum BusError {
    #[error("Failed to read {what} from {path}: {reason}")]
    ReadFailed {
        what: &'static str,
        path: String,
        reason: String,
    },

    #[error("Failed to write {what} to {path}: {reason}")]
    WriteFailed {
        what: &'static str,
        path: String,
        reason: String,
    },

    #[error("Malformed settings in {path}: {reason}")]
    MalformedSettings { path: String, reason: String },
}

/// External command errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Failed to launch {command}")]
    LaunchFailed { command: String },

    #[error("{command} exited with {exit_code:?}: {stderr}")]
    Failed {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, TsgxError>;
