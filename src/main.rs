//! tsgx - Tailscale remote access supervisor for GX devices
//!
//! Runs the control loop that keeps the tailscale client connected
//! according to the GUI settings, and offers small helpers to inspect
//! and poke the running daemon.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tsgx_core::error::TsgxError;
use tsgx_core::{init_logging, LevelFilter};

mod cli;
mod daemon;

#[derive(Parser)]
#[command(name = "tsgx")]
#[command(about = "Tailscale remote access supervisor for GX devices")]
struct Cli {
    /// Daemon configuration file (default: /data/conf/tsgx/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level: error, warn, info, debug or trace
    #[arg(long, global = true, default_value = "info")]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the control loop
    Run {
        /// Detach from the terminal
        #[arg(long)]
        daemon: bool,

        /// PID file used with --daemon
        #[arg(long)]
        pid_file: Option<PathBuf>,
    },
    /// Show the status published by the control loop
    Status {
        /// Print raw JSON
        #[arg(long)]
        json: bool,
    },
    /// Ask the control loop to log out of the tailnet
    Logout,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(2);
    }

    let result = match cli.command {
        Commands::Run { daemon, pid_file } => {
            cli::run::run_daemon(cli.config.as_deref(), daemon, pid_file)
        }
        Commands::Status { json } => cli::status::run_status(cli.config.as_deref(), json),
        Commands::Logout => cli::logout::run_logout(cli.config.as_deref()),
    };

    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            let exit_code = match e {
                // Configuration errors (exit code 2)
                TsgxError::Config(_) | TsgxError::Toml(_) | TsgxError::TomlSerialize(_) => 2,
                // Runtime errors (exit code 1)
                TsgxError::Bus(_)
                | TsgxError::Command(_)
                | TsgxError::Daemon(_)
                | TsgxError::Io(_)
                | TsgxError::Json(_) => 1,
            };

            eprintln!("{}", e);
            std::process::exit(exit_code);
        }
    }
}
