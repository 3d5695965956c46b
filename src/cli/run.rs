//! Run command: the control loop
//!
//! Startup housekeeping (migrations, stock firmware check), then one
//! controller cycle per second until SIGTERM or Ctrl+C.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tokio::signal::unix::{signal, SignalKind};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

use tsgx_core::bus::SettingsBus;
use tsgx_core::config::toml_config::load_config;
use tsgx_core::config::DaemonConfig;
use tsgx_core::error::TsgxError;
use tsgx_core::migration::{migrate_legacy_settings, migrate_state_dir, stock_integration_present};
use tsgx_core::version::installed_version;
use tsgx_core::vpn::controller::CYCLE_INTERVAL;
use tsgx_core::vpn::{
    CommandRunner, Controller, ControllerPaths, Daemontools, ServiceSupervisor,
    SystemCommandRunner,
};

use crate::daemon::process::{default_pid_file, DaemonProcess};

pub fn run_daemon(
    config_path: Option<&Path>,
    daemon: bool,
    pid_file: Option<PathBuf>,
) -> Result<(), TsgxError> {
    let config = load_config(config_path)?;

    info!(
        ">>>> tsgx control {} starting",
        installed_version(&config.version_file)
    );

    run_migrations(&config);

    if stock_integration_present(&config.stock_install_dir) {
        warn!(
            "{:?} exists, the firmware provides tailscale; shutting down this integration",
            config.stock_install_dir
        );
        let control = Daemontools::new(
            SystemCommandRunner,
            &config.svstat_binary,
            &config.svc_binary,
            &config.control_service,
        );
        if let Err(e) = control.stop() {
            error!("failed to stop {}: {}", config.control_service, e);
        }
        return Ok(());
    }

    // Held until the loop ends so the PID file is removed on exit
    let _process = if daemon {
        let process = DaemonProcess::new(pid_file.unwrap_or_else(default_pid_file));
        if process.is_running()? {
            return Err(TsgxError::Daemon(
                "another tsgx control loop is already running".to_string(),
            ));
        }
        process.daemonize()?;
        Some(process)
    } else {
        None
    };

    let runner = SystemCommandRunner;
    let supervisor = Daemontools::new(
        runner,
        &config.svstat_binary,
        &config.svc_binary,
        &config.backend_service,
    );
    let paths = ControllerPaths {
        tailscale: config.resolve_tailscale_binary(),
        sysctl: config.sysctl_binary.clone(),
    };
    let controller = Controller::new(runner, supervisor, super::file_bus(&config), paths);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(control_loop(controller))?;

    info!(">>>> tsgx control exiting");
    Ok(())
}

fn run_migrations(config: &DaemonConfig) {
    match migrate_legacy_settings(&config.legacy_settings_file, &config.settings_file) {
        Ok(true) => info!("migrated {:?}", config.legacy_settings_file),
        Ok(false) => {}
        Err(e) => error!("settings migration failed: {}", e),
    }
    match migrate_state_dir(&config.legacy_state_dir, &config.state_dir) {
        Ok(true) => info!("moved tailscale state to {:?}", config.state_dir),
        Ok(false) => {}
        Err(e) => error!("state directory migration failed: {}", e),
    }
}

/// Cycles run to completion; signals are only seen between cycles
async fn control_loop<R, S, B>(mut controller: Controller<R, S, B>) -> Result<(), TsgxError>
where
    R: CommandRunner,
    S: ServiceSupervisor,
    B: SettingsBus,
{
    let mut ticker = interval(CYCLE_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                controller.run_cycle(Instant::now());
            }
            _ = interrupt.recv() => {
                info!("received SIGINT");
                break;
            }
            _ = terminate.recv() => {
                info!("received SIGTERM");
                break;
            }
        }
    }

    Ok(())
}
