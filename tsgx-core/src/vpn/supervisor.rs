//! Backend service supervision
//!
//! The tailscale backend (tailscaled) runs as a daemontools service; it is
//! queried with `svstat` and started/stopped with `svc`.

use crate::error::CommandError;
use crate::vpn::command::CommandRunner;
use tracing::warn;

/// Backend liveness as seen by the supervisor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Running,
    NotRunning,
    /// Service is not installed, or the query could not be made
    Absent,
}

/// Start/stop/query a background service
pub trait ServiceSupervisor {
    fn liveness(&self) -> Liveness;
    fn start(&self) -> Result<(), CommandError>;
    fn stop(&self) -> Result<(), CommandError>;
}

/// daemontools supervisor for one service directory
pub struct Daemontools<R: CommandRunner> {
    runner: R,
    svstat: String,
    svc: String,
    service_dir: String,
}

impl<R: CommandRunner> Daemontools<R> {
    pub fn new(
        runner: R,
        svstat: impl Into<String>,
        svc: impl Into<String>,
        service_dir: impl Into<String>,
    ) -> Self {
        Self {
            runner,
            svstat: svstat.into(),
            svc: svc.into(),
            service_dir: service_dir.into(),
        }
    }

    fn svc(&self, flag: &str) -> Result<(), CommandError> {
        let args = vec![flag.to_string(), self.service_dir.clone()];
        let command = format!("{} {} {}", self.svc, flag, self.service_dir);
        match self.runner.run(&self.svc, &args) {
            None => Err(CommandError::LaunchFailed { command }),
            Some(out) if out.success() => Ok(()),
            Some(out) => Err(CommandError::Failed {
                command,
                exit_code: out.exit_code,
                stderr: out.stderr,
            }),
        }
    }
}

impl<R: CommandRunner> ServiceSupervisor for Daemontools<R> {
    fn liveness(&self) -> Liveness {
        let Some(out) = self.runner.run(&self.svstat, &[self.service_dir.clone()]) else {
            warn!("{} not in services", self.service_dir);
            return Liveness::Absent;
        };
        parse_svstat(&out.stdout, &out.stderr).unwrap_or_else(|| {
            warn!("{} not in services", self.service_dir);
            Liveness::Absent
        })
    }

    fn start(&self) -> Result<(), CommandError> {
        self.svc("-u")
    }

    fn stop(&self) -> Result<(), CommandError> {
        self.svc("-d")
    }
}

/// Interpret `svstat` output; `None` when the service does not exist
///
/// `/service/x: up (pid 1234) 56 seconds` means running; any other
/// output for an existing service means not running.
pub fn parse_svstat(stdout: &str, stderr: &str) -> Option<Liveness> {
    if stderr.contains("does not exist") || stdout.contains("does not exist") {
        return None;
    }
    if stdout.contains(": up") {
        Some(Liveness::Running)
    } else {
        Some(Liveness::NotRunning)
    }
}
