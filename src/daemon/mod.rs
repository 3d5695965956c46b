//! Daemon mode for the control loop
//!
//! PID file handling and detaching from the terminal.

pub mod process;
