// Shared fakes for the controller tests
#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::time::{Duration, Instant};

use tsgx_core::bus::{PublishedStatus, Settings, SettingsBus};
use tsgx_core::error::{BusError, CommandError};
use tsgx_core::types::{AuthKey, GuiCommand};
use tsgx_core::vpn::{
    CommandOutput, CommandRunner, Controller, ControllerPaths, Liveness, ServiceSupervisor,
};

pub const TAILSCALE: &str = "/data/TailscaleGX/tailscale";
pub const SYSCTL: &str = "sysctl";

/// Runner returning scripted output per command key
///
/// The key is the tailscale subcommand (`status`, `up`, ...) or the
/// program name for anything else. Unscripted commands succeed silently.
#[derive(Default)]
pub struct ScriptedRunner {
    responses: RefCell<HashMap<String, Option<CommandOutput>>>,
    calls: RefCell<Vec<(String, Vec<String>)>>,
}

impl ScriptedRunner {
    pub fn set(&self, key: &str, output: Option<CommandOutput>) {
        self.responses.borrow_mut().insert(key.to_string(), output);
    }

    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.borrow().clone()
    }

    /// Number of calls made for `key`
    pub fn count(&self, key: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|(program, args)| Self::key(program, args) == key)
            .count()
    }

    /// Arguments of the most recent call for `key`
    pub fn last_args(&self, key: &str) -> Option<Vec<String>> {
        self.calls
            .borrow()
            .iter()
            .rev()
            .find(|(program, args)| Self::key(program, args) == key)
            .map(|(_, args)| args.clone())
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    fn key(program: &str, args: &[String]) -> String {
        if program == TAILSCALE {
            args.first().cloned().unwrap_or_default()
        } else {
            program.to_string()
        }
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, program: &str, args: &[String]) -> Option<CommandOutput> {
        self.calls
            .borrow_mut()
            .push((program.to_string(), args.to_vec()));
        let key = Self::key(program, args);
        self.responses
            .borrow()
            .get(&key)
            .cloned()
            .unwrap_or_else(|| Some(CommandOutput::new("", "", 0)))
    }
}

pub struct FakeSupervisor {
    pub liveness: Cell<Liveness>,
    pub starts: Cell<usize>,
    pub stops: Cell<usize>,
}

impl FakeSupervisor {
    pub fn running() -> Self {
        Self::with(Liveness::Running)
    }

    pub fn with(liveness: Liveness) -> Self {
        Self {
            liveness: Cell::new(liveness),
            starts: Cell::new(0),
            stops: Cell::new(0),
        }
    }
}

impl ServiceSupervisor for FakeSupervisor {
    fn liveness(&self) -> Liveness {
        self.liveness.get()
    }

    fn start(&self) -> Result<(), CommandError> {
        self.starts.set(self.starts.get() + 1);
        Ok(())
    }

    fn stop(&self) -> Result<(), CommandError> {
        self.stops.set(self.stops.get() + 1);
        Ok(())
    }
}

/// In-memory bus recording everything published
#[derive(Default)]
pub struct MemoryBus {
    pub settings: RefCell<Settings>,
    pub command: RefCell<Option<String>>,
    pub published: RefCell<Vec<PublishedStatus>>,
    /// Number of upcoming `read_settings` calls that fail
    pub failing_reads: Cell<u32>,
}

impl MemoryBus {
    pub fn enabled() -> Self {
        let bus = Self::default();
        bus.settings.borrow_mut().enabled = true;
        bus
    }

    pub fn set_auth_key(&self, key: &str) {
        self.settings.borrow_mut().auth_key = AuthKey::new(key);
    }

    pub fn post(&self, command: &str) {
        *self.command.borrow_mut() = Some(command.to_string());
    }

    pub fn last(&self) -> PublishedStatus {
        self.published.borrow().last().cloned().unwrap_or_default()
    }
}

impl SettingsBus for MemoryBus {
    fn read_settings(&self) -> Result<Settings, BusError> {
        let failing = self.failing_reads.get();
        if failing > 0 {
            self.failing_reads.set(failing - 1);
            return Err(BusError::MalformedSettings {
                path: "settings.toml".to_string(),
                reason: "unexpected end of input".to_string(),
            });
        }
        Ok(self.settings.borrow().clone())
    }

    fn take_gui_command(&self) -> Result<Option<GuiCommand>, BusError> {
        let raw = self.command.borrow_mut().take();
        Ok(raw.as_deref().and_then(GuiCommand::parse))
    }

    fn publish(&self, status: &PublishedStatus) -> Result<(), BusError> {
        self.published.borrow_mut().push(status.clone());
        Ok(())
    }
}

pub type TestController = Controller<ScriptedRunner, FakeSupervisor, MemoryBus>;

pub fn controller(supervisor: FakeSupervisor, bus: MemoryBus) -> TestController {
    Controller::new(
        ScriptedRunner::default(),
        supervisor,
        bus,
        ControllerPaths {
            tailscale: TAILSCALE.to_string(),
            sysctl: SYSCTL.to_string(),
        },
    )
}

pub fn at(start: Instant, secs: u64) -> Instant {
    start + Duration::from_secs(secs)
}

pub fn stopped() -> Option<CommandOutput> {
    Some(CommandOutput::new("Tailscale is stopped.", "", 1))
}

pub fn logged_out() -> Option<CommandOutput> {
    Some(CommandOutput::new("Logged out.", "", 1))
}

pub fn needs_login(url: &str) -> Option<CommandOutput> {
    Some(CommandOutput::new(
        format!("Logged out.\nLog in at: {}", url),
        "",
        1,
    ))
}

pub fn connected(ipv4: &str, host: &str) -> Option<CommandOutput> {
    Some(CommandOutput::new(
        format!(
            "{}  {}  user@  linux  -\n100.64.0.77  laptop  user@  macOS  -",
            ipv4, host
        ),
        "",
        0,
    ))
}

pub fn ips(ipv4: &str, ipv6: &str) -> Option<CommandOutput> {
    Some(CommandOutput::new(format!("{}\n{}", ipv4, ipv6), "", 0))
}

/// Output of a status call that matches no marker
pub fn starting() -> Option<CommandOutput> {
    Some(CommandOutput::new("", "", 1))
}
