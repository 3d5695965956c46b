//! Type definitions and wrappers for secure data handling
//!
//! The Tailscale auth key grants a device access to the tailnet, so it is
//! wrapped with the secrecy crate to keep it out of logs and debug output.

use secrecy::{ExposeSecret, Secret};

/// Tailscale authentication key
///
/// An empty key means "no key configured": the client then asks for an
/// interactive login through a URL instead.
#[derive(Clone, Debug)]
pub struct AuthKey(Secret<String>);

impl AuthKey {
    /// Create a new AuthKey, trimming surrounding whitespace
    pub fn new(key: impl Into<String>) -> Self {
        let key: String = key.into();
        Self(Secret::new(key.trim().to_string()))
    }

    /// An unset key
    pub fn empty() -> Self {
        Self::new(String::new())
    }

    /// Expose the key value (use with caution!)
    ///
    /// Only for building the `--auth-key=` argument.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    pub fn is_empty(&self) -> bool {
        self.expose().is_empty()
    }

    /// Short form that is safe to log, e.g. `tskey-a…(40 chars)`
    pub fn masked(&self) -> String {
        let key = self.expose();
        if key.is_empty() {
            return "(none)".to_string();
        }
        let prefix: String = key.chars().take(7).collect();
        format!("{}…({} chars)", prefix, key.chars().count())
    }
}

impl PartialEq for AuthKey {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl Eq for AuthKey {}

impl Default for AuthKey {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<String> for AuthKey {
    fn from(key: String) -> Self {
        Self::new(key)
    }
}

/// Commands the GUI can post through the bus command slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuiCommand {
    /// Log out of the tailnet so a new login can be made
    Logout,
    /// Anything else; acknowledged and ignored
    Unknown(String),
}

impl GuiCommand {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "" => None,
            "logout" => Some(Self::Logout),
            other => Some(Self::Unknown(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Logout => "logout",
            Self::Unknown(raw) => raw,
        }
    }
}
