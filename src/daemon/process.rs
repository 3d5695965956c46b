//! Daemon process management
//!
//! Handles PID file management and detaching the control loop.

use std::fs;
use std::path::PathBuf;
use std::process;

use daemonize::Daemonize;
use tracing::info;

use tsgx_core::error::TsgxError;

/// Represents a daemon process
pub struct DaemonProcess {
    pid_file: PathBuf,
}

impl DaemonProcess {
    /// Create a new daemon process manager
    pub fn new(pid_file: PathBuf) -> Self {
        Self { pid_file }
    }

    /// Check if a daemon is already running
    pub fn is_running(&self) -> Result<bool, TsgxError> {
        if !self.pid_file.exists() {
            return Ok(false);
        }

        let pid_content = fs::read_to_string(&self.pid_file)
            .map_err(|e| TsgxError::Daemon(format!("Failed to read PID file: {}", e)))?;

        let pid: i32 = pid_content
            .trim()
            .parse()
            .map_err(|_| TsgxError::Daemon("Invalid PID in PID file".to_string()))?;

        match nix::unistd::getpgid(Some(nix::unistd::Pid::from_raw(pid))) {
            Ok(_) => Ok(true),
            Err(nix::errno::Errno::ESRCH) => {
                // Stale PID file
                let _ = fs::remove_file(&self.pid_file);
                Ok(false)
            }
            Err(e) => Err(TsgxError::Daemon(format!(
                "Failed to check process status: {}",
                e
            ))),
        }
    }

    /// Daemonize the current process
    ///
    /// Must run before any runtime threads are started.
    pub fn daemonize(&self) -> Result<(), TsgxError> {
        if let Some(parent) = self.pid_file.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                TsgxError::Daemon(format!("Failed to create PID file directory: {}", e))
            })?;
        }

        let daemonize = Daemonize::new()
            .pid_file(&self.pid_file)
            .chown_pid_file(true)
            .working_directory("/")
            .umask(0o027);

        daemonize
            .start()
            .map_err(|e| TsgxError::Daemon(format!("Failed to daemonize process: {}", e)))?;

        info!("Daemonized, PID: {}", process::id());
        Ok(())
    }
}

impl Drop for DaemonProcess {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.pid_file);
    }
}

/// Default PID file path
pub fn default_pid_file() -> PathBuf {
    PathBuf::from("/run/tsgx/tsgx.pid")
}
