//! Tailscale CLI invocations
//!
//! Builds the argument lists for the `tailscale` subcommands the control
//! loop uses and runs them through a [`CommandRunner`].

use crate::types::AuthKey;
use crate::vpn::command::{CommandOutput, CommandRunner};

/// Client-side timeout for `up` and `login`. The command returns almost
/// immediately and the following status polls report the outcome.
pub const HANDSHAKE_TIMEOUT_ARG: &str = "--timeout=0.1s";

/// Flag toggled by the exit-node setting
pub const EXIT_NODE_FLAG: &str = "--advertise-exit-node";

/// Borrowed view of the tailscale binary plus the runner used to call it
pub struct TailscaleCli<'a, R: CommandRunner> {
    runner: &'a R,
    binary: &'a str,
}

impl<'a, R: CommandRunner> TailscaleCli<'a, R> {
    pub fn new(runner: &'a R, binary: &'a str) -> Self {
        Self { runner, binary }
    }

    pub fn status(&self) -> Option<CommandOutput> {
        self.run(vec!["status".to_string()])
    }

    pub fn ip(&self) -> Option<CommandOutput> {
        self.run(vec!["ip".to_string()])
    }

    /// `tailscale up`, which connects if already logged in
    pub fn up(&self, hostname: &str, auth_key: &AuthKey) -> Option<CommandOutput> {
        self.run(handshake_args("up", hostname, auth_key))
    }

    pub fn login(&self, hostname: &str, auth_key: &AuthKey) -> Option<CommandOutput> {
        self.run(handshake_args("login", hostname, auth_key))
    }

    /// `tailscale logout`; takes no timeout and may block for a while
    pub fn logout(&self) -> Option<CommandOutput> {
        self.run(vec!["logout".to_string()])
    }

    pub fn set_exit_node(&self, enabled: bool) -> Option<CommandOutput> {
        self.run(vec!["set".to_string(), format!("{}={}", EXIT_NODE_FLAG, enabled)])
    }

    fn run(&self, args: Vec<String>) -> Option<CommandOutput> {
        self.runner.run(self.binary, &args)
    }
}

/// Arguments for `up`/`login`; hostname and key are only passed when set
pub fn handshake_args(subcommand: &str, hostname: &str, auth_key: &AuthKey) -> Vec<String> {
    let mut args = vec![subcommand.to_string(), HANDSHAKE_TIMEOUT_ARG.to_string()];
    if !hostname.is_empty() {
        args.push(format!("--hostname={}", hostname));
    }
    if !auth_key.is_empty() {
        args.push(format!("--auth-key={}", auth_key.expose()));
    }
    args
}

/// A short-timeout handshake command "failing" with a timeout is the
/// normal case, not an error.
pub fn handshake_accepted(output: &CommandOutput) -> bool {
    output.success() || output.stderr.contains("timeout")
}
