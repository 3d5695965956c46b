//! Core library for the tsgx remote access supervisor
//!
//! This crate provides the Tailscale connection lifecycle state machine,
//! the parsers for the client's status output, and the settings/status
//! bus used to exchange configuration and telemetry with the GUI.

pub mod error;
pub mod types;

pub mod bus;
pub mod config;
pub mod migration;
pub mod version;
pub mod vpn;

pub use tracing_subscriber::filter::LevelFilter;

/// Initialize logging infrastructure
///
/// Logs to the systemd journal when running under systemd, otherwise
/// to stderr. GX devices run the daemon under daemontools, where stderr
/// is picked up by multilog.
pub fn init_logging(level: LevelFilter) -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    #[cfg(target_os = "linux")]
    {
        if std::env::var("JOURNAL_STREAM").is_ok() {
            let journal_layer = tracing_journald::layer()?;
            tracing_subscriber::registry()
                .with(journal_layer)
                .with(level)
                .init();
            return Ok(());
        }
    }

    // multilog adds its own timestamps
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .without_time()
                .with_target(false),
        )
        .with(level)
        .init();

    Ok(())
}
