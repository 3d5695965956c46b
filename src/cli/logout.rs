//! Logout command
//!
//! Posts a logout into the GUI command slot. The running control loop
//! picks it up on its next cycle.

use std::path::Path;

use tsgx_core::config::toml_config::load_config;
use tsgx_core::error::TsgxError;
use tsgx_core::types::GuiCommand;

pub fn run_logout(config_path: Option<&Path>) -> Result<(), TsgxError> {
    let config = load_config(config_path)?;
    let bus = super::file_bus(&config);

    bus.post_command(&GuiCommand::Logout)?;
    println!("✓ Logout requested");
    println!("The control loop will log out of the tailnet within a second");
    Ok(())
}
