//! Status command
//!
//! Reads the status file the control loop publishes every cycle.

use std::path::Path;

use colored::Colorize;
use tsgx_core::bus::file::StatusRecord;
use tsgx_core::config::toml_config::load_config;
use tsgx_core::error::TsgxError;
use tsgx_core::vpn::ConnectionState;

pub fn run_status(config_path: Option<&Path>, json: bool) -> Result<(), TsgxError> {
    let config = load_config(config_path)?;
    let bus = super::file_bus(&config);

    let Some(record) = bus.read_status()? else {
        println!("{}", "No status published".yellow());
        println!("Is the control loop running? Expected {:?}", config.status_file);
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }

    print_record(&record);
    Ok(())
}

fn print_record(record: &StatusRecord) {
    let status = &record.status;
    let state = match status.connection_state() {
        Some(state @ ConnectionState::Connected) => state.to_string().green().bold(),
        Some(state @ ConnectionState::CheckAuthKey) => state.to_string().red().bold(),
        Some(state) => state.to_string().yellow(),
        None => format!("invalid state {}", status.state).red(),
    };

    println!("{:<10} {} ({})", "State:", state, status.state);
    if !status.login_link.is_empty() {
        println!("{:<10} {}", "Login:", status.login_link.cyan());
    }
    if !status.ipv4.is_empty() {
        println!("{:<10} {}", "IPv4:", status.ipv4);
        println!("{:<10} {}", "IPv6:", status.ipv6);
    }
    if !status.hostname.is_empty() {
        println!("{:<10} {}", "Hostname:", status.hostname);
    }
    println!("{:<10} {}", "Updated:", record.updated_at.dimmed());
}
