//! Tailscale connection module
//!
//! Handles the tailscale CLI integration, backend supervision and the
//! connection lifecycle state machine.

pub mod command;
pub mod controller;
pub mod forwarding;
pub mod hostname;
pub mod output_parser;
pub mod state;
pub mod supervisor;
pub mod tailscale;

// Public re-exports
pub use command::{CommandOutput, CommandRunner, SystemCommandRunner};
pub use controller::{Controller, ControllerPaths};
pub use output_parser::{StatusOutcome, StatusParser};
pub use state::ConnectionState;
pub use supervisor::{Daemontools, Liveness, ServiceSupervisor};
