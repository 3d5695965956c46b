//! Parser for `tailscale status` and `tailscale ip` output
//!
//! The client only reports its state as English text. All marker strings
//! live here so a change in the client's wording touches one file.

use crate::types::AuthKey;
use crate::vpn::command::CommandOutput;
use regex::Regex;
use std::net::{Ipv4Addr, Ipv6Addr};

/// stderr marker when tailscaled is not reachable
pub const MARKER_CONNECT_FAILED: &str = "failed to connect";
/// stdout marker for a stopped client
pub const MARKER_STOPPED: &str = "Tailscale is stopped";
/// stdout marker for a pending interactive login
pub const MARKER_LOGIN: &str = "Log in at";
/// stdout marker for a logged out client
pub const MARKER_LOGGED_OUT: &str = "Logged out";

/// Placeholder published when `tailscale ip` output can't be used
pub const UNKNOWN_ADDRESS: &str = "?";

/// Classified result of a `tailscale status` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusOutcome {
    /// Command could not be run
    NoResponse,
    /// Backend not reachable
    ConnectFailed,
    Stopped,
    /// Interactive login required; carries the login URL
    AwaitingLogin { login_url: String },
    LoggedOut,
    /// Exit code 0 with no other marker; carries the status lines
    ConnectedOk { lines: Vec<String> },
    /// None of the above; state must not change
    Unrecognized,
}

/// Parser for tailscale CLI output
pub struct StatusParser {
    /// Pattern for "Log in at: https://..."
    login_url_pattern: Regex,
}

impl StatusParser {
    pub fn new() -> Self {
        Self {
            login_url_pattern: Regex::new(r"Log in at:?\s*(\S+)")
                .expect("Failed to compile login_url pattern"),
        }
    }

    /// Classify a status response
    ///
    /// Checks run in a fixed order and the first match wins. The client
    /// never emits two of these markers at once in practice.
    pub fn classify(&self, output: Option<&CommandOutput>, auth_key: &AuthKey) -> StatusOutcome {
        let Some(output) = output else {
            return StatusOutcome::NoResponse;
        };

        if output.stderr.contains(MARKER_CONNECT_FAILED) {
            return StatusOutcome::ConnectFailed;
        }

        if output.stdout.contains(MARKER_STOPPED) {
            return StatusOutcome::Stopped;
        }

        if output.stdout.contains(MARKER_LOGIN) && auth_key.is_empty() {
            return StatusOutcome::AwaitingLogin {
                login_url: self.login_url(&output.stdout),
            };
        }

        if output.stdout.contains(MARKER_LOGGED_OUT) {
            return StatusOutcome::LoggedOut;
        }

        if output.success() {
            return StatusOutcome::ConnectedOk {
                lines: output.stdout.lines().map(str::to_string).collect(),
            };
        }

        StatusOutcome::Unrecognized
    }

    /// URL from the second line of the status text, e.g.
    ///
    /// ```text
    /// Logged out.
    /// Log in at: https://login.tailscale.com/a/1234abcd
    /// ```
    ///
    /// Falls back to the first line carrying the marker.
    fn login_url(&self, stdout: &str) -> String {
        let second = stdout.lines().nth(1).filter(|line| line.contains(MARKER_LOGIN));
        let line = second.or_else(|| stdout.lines().find(|line| line.contains(MARKER_LOGIN)));

        line.and_then(|line| self.login_url_pattern.captures(line))
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default()
    }
}

impl Default for StatusParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse `tailscale ip` output: exactly an IPv4 line then an IPv6 line
///
/// Anything else yields `("?", "?")`.
pub fn parse_ip_output(stdout: &str) -> (String, String) {
    let lines: Vec<&str> = stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    if let [v4, v6] = lines.as_slice() {
        if v4.parse::<Ipv4Addr>().is_ok() && v6.parse::<Ipv6Addr>().is_ok() {
            return (v4.to_string(), v6.to_string());
        }
    }

    (UNKNOWN_ADDRESS.to_string(), UNKNOWN_ADDRESS.to_string())
}

/// Hostname of this node from `tailscale status` lines
///
/// Status lines look like `100.101.102.103  my-gx  user@  linux  -`; the
/// line holding our own IPv4 address has our hostname as second column.
pub fn find_peer_hostname(lines: &[String], ipv4: &str) -> Option<String> {
    if ipv4.is_empty() || ipv4 == UNKNOWN_ADDRESS {
        return None;
    }
    lines
        .iter()
        .filter(|line| line.split_whitespace().any(|token| token == ipv4))
        .find_map(|line| line.split_whitespace().nth(1).map(str::to_string))
}
