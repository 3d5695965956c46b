//! External command execution
//!
//! Everything the daemon does to the outside world goes through
//! [`CommandRunner`], so the state machine can be driven by a scripted
//! runner in tests.

use std::process::{Command, Stdio};

use tracing::{debug, error};

/// Captured result of a finished command
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    /// stdout, lossily decoded and trimmed
    pub stdout: String,
    /// stderr, lossily decoded and trimmed
    pub stderr: String,
    /// None when the process was killed by a signal
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    pub fn new(stdout: impl Into<String>, stderr: impl Into<String>, exit_code: i32) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_code: Some(exit_code),
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs external commands
///
/// Returns `None` when the command could not be launched at all. No
/// retries are made here; the control loop re-polls every cycle.
pub trait CommandRunner {
    fn run(&self, program: &str, args: &[String]) -> Option<CommandOutput>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, program: &str, args: &[String]) -> Option<CommandOutput> {
        (**self).run(program, args)
    }
}

/// Runs commands with `std::process::Command` and waits for them
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn run(&self, program: &str, args: &[String]) -> Option<CommandOutput> {
        debug!("running {} {}", program, redact_args(args).join(" "));

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output();

        match output {
            Ok(out) => Some(CommandOutput {
                stdout: String::from_utf8_lossy(&out.stdout).trim().to_string(),
                stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
                exit_code: out.status.code(),
            }),
            Err(e) => {
                error!("failed to launch {}: {}", program, e);
                None
            }
        }
    }
}

/// Copy of `args` with secret values replaced, for logging
pub fn redact_args(args: &[String]) -> Vec<String> {
    args.iter()
        .map(|arg| {
            if arg.starts_with("--auth-key=") {
                "--auth-key=<redacted>".to_string()
            } else {
                arg.clone()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_failure_is_no_result() {
        let runner = SystemCommandRunner;
        assert!(runner
            .run("/nonexistent/definitely-not-a-binary", &[])
            .is_none());
    }

    #[test]
    fn test_output_is_trimmed() {
        let runner = SystemCommandRunner;
        let out = runner
            .run("sh", &["-c".to_string(), "echo '  hi  '; exit 3".to_string()])
            .unwrap();
        assert_eq!(out.stdout, "hi");
        assert_eq!(out.exit_code, Some(3));
        assert!(!out.success());
    }

    #[test]
    fn test_redact_args() {
        let args = vec!["up".to_string(), "--auth-key=tskey-secret".to_string()];
        assert_eq!(redact_args(&args), vec!["up", "--auth-key=<redacted>"]);
    }
}
