//! Connection lifecycle states
//!
//! The numeric codes are what the GUI reads from `/State`, so they are
//! part of the bus contract and must not be renumbered.

use serde::{Deserialize, Serialize};

/// Tailscale connection states as reported to the GUI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ConnectionState {
    /// Nothing known yet (daemon just started)
    #[default]
    Unknown,

    /// Backend service start was requested this cycle
    BackendStarting,

    /// Backend is down, disabled, or not reachable
    NotRunning,

    /// Backend is up but the client reports it is stopped
    Stopped,

    /// Client is logged out of the tailnet
    LoggedOut,

    /// An up/login/logout command was issued and the client has not settled
    WaitingForResponse,

    /// Client is waiting for the user to visit the login link
    ConnectWait,

    /// Connected to the tailnet
    Connected,

    /// Handshake timed out with an auth key set; the key may be invalid.
    /// Reported instead of the real state, never held as the real state.
    CheckAuthKey,
}

impl ConnectionState {
    /// Numeric code published on the bus
    pub fn code(self) -> i32 {
        match self {
            Self::Unknown => 0,
            Self::BackendStarting => 1,
            Self::NotRunning => 2,
            Self::Stopped => 3,
            Self::LoggedOut => 4,
            Self::WaitingForResponse => 5,
            Self::ConnectWait => 6,
            Self::Connected => 100,
            Self::CheckAuthKey => 200,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        let state = match code {
            0 => Self::Unknown,
            1 => Self::BackendStarting,
            2 => Self::NotRunning,
            3 => Self::Stopped,
            4 => Self::LoggedOut,
            5 => Self::WaitingForResponse,
            6 => Self::ConnectWait,
            100 => Self::Connected,
            200 => Self::CheckAuthKey,
            _ => return None,
        };
        Some(state)
    }

    pub fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Unknown => "unknown",
            Self::BackendStarting => "starting",
            Self::NotRunning => "not running",
            Self::Stopped => "stopped",
            Self::LoggedOut => "logged out",
            Self::WaitingForResponse => "waiting for response",
            Self::ConnectWait => "waiting for login",
            Self::Connected => "connected",
            Self::CheckAuthKey => "check auth key",
        };
        f.write_str(text)
    }
}
