//! Settings/status bus
//!
//! The GUI and the control loop meet here: the GUI writes settings and
//! posts commands, the control loop publishes state and addresses. The
//! [`SettingsBus`] trait is the seam; [`file::FileBus`] is the transport
//! shipped with the daemon.

use serde::{Deserialize, Serialize};

use crate::error::BusError;
use crate::types::{AuthKey, GuiCommand};
use crate::vpn::state::ConnectionState;

pub mod file;

pub use file::FileBus;

/// Custom argument that turns on exit-node mode
pub const EXIT_NODE_ARGUMENT: &str = "--advertise-exit-node=true";

/// User settings, polled once per cycle
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Settings {
    /// Remote access enabled
    pub enabled: bool,

    /// Extra tailscale arguments; only the exit-node flag is honoured
    pub custom_arguments: String,

    /// Optional auth key for non-interactive login
    pub auth_key: AuthKey,

    /// GX system name, the source of the tailscale hostname
    pub system_name: Option<String>,
}

impl Settings {
    pub fn exit_node_requested(&self) -> bool {
        self.custom_arguments
            .split_whitespace()
            .any(|arg| arg == EXIT_NODE_ARGUMENT)
    }
}

/// Values published every cycle
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PublishedStatus {
    /// State code, see [`ConnectionState::code`]
    pub state: i32,
    /// Login URL while waiting for an interactive login, else empty
    pub login_link: String,
    pub ipv4: String,
    pub ipv6: String,
    pub hostname: String,
}

impl PublishedStatus {
    pub fn connection_state(&self) -> Option<ConnectionState> {
        ConnectionState::from_code(self.state)
    }
}

/// Read settings, take GUI commands, publish status
pub trait SettingsBus {
    fn read_settings(&self) -> Result<Settings, BusError>;

    /// Take the pending GUI command, clearing the slot so the GUI can
    /// send another
    fn take_gui_command(&self) -> Result<Option<GuiCommand>, BusError>;

    fn publish(&self, status: &PublishedStatus) -> Result<(), BusError>;
}
