//! Connection lifecycle state machine
//!
//! [`Controller::run_cycle`] is called once per second by the daemon. Each
//! cycle re-derives the connection state from a fresh `tailscale status`,
//! issues at most one state-changing CLI command, and publishes the result.
//! There are no retry counters: polling again next cycle is the retry.

use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use crate::bus::{PublishedStatus, Settings, SettingsBus};
use crate::types::{AuthKey, GuiCommand};
use crate::vpn::command::{CommandOutput, CommandRunner};
use crate::vpn::forwarding::ForwardingState;
use crate::vpn::hostname::HostnameTracker;
use crate::vpn::output_parser::{find_peer_hostname, parse_ip_output, StatusOutcome, StatusParser};
use crate::vpn::state::ConnectionState;
use crate::vpn::supervisor::{Liveness, ServiceSupervisor};
use crate::vpn::tailscale::{handshake_accepted, TailscaleCli};

/// Time between cycles
pub const CYCLE_INTERVAL: Duration = Duration::from_secs(1);

/// How long the handshake may stall (with an auth key set) before the
/// connection is reset and the key reported as suspect
pub const RESPONSE_TIMEOUT: Duration = Duration::from_secs(30);

/// Paths of the external programs the controller calls
#[derive(Debug, Clone)]
pub struct ControllerPaths {
    pub tailscale: String,
    pub sysctl: String,
}

/// Owns the lifecycle state and the collaborators it drives
pub struct Controller<R, S, B>
where
    R: CommandRunner,
    S: ServiceSupervisor,
    B: SettingsBus,
{
    runner: R,
    supervisor: S,
    bus: B,
    paths: ControllerPaths,
    parser: StatusParser,

    state: ConnectionState,
    previous_state: ConnectionState,
    /// Reported as `CheckAuthKey` while set
    check_auth_key: bool,
    /// Start of the last cycle that was not stalled in `WaitingForResponse`
    last_response: Option<Instant>,
    /// None until the first cycle with the backend running
    auth_key: Option<AuthKey>,
    /// None until a settings read succeeds
    settings: Option<Settings>,
    hostname: HostnameTracker,
    forwarding: ForwardingState,
    /// Our tailnet IPv4 from the previous `ip` query
    ipv4: String,
    ipv6: String,
    peer_hostname: Option<String>,
}

impl<R, S, B> Controller<R, S, B>
where
    R: CommandRunner,
    S: ServiceSupervisor,
    B: SettingsBus,
{
    pub fn new(runner: R, supervisor: S, bus: B, paths: ControllerPaths) -> Self {
        Self {
            runner,
            supervisor,
            bus,
            paths,
            parser: StatusParser::new(),
            state: ConnectionState::Unknown,
            previous_state: ConnectionState::Unknown,
            check_auth_key: false,
            last_response: None,
            auth_key: None,
            settings: None,
            hostname: HostnameTracker::new(),
            forwarding: ForwardingState::new(),
            ipv4: String::new(),
            ipv6: String::new(),
            peer_hostname: None,
        }
    }

    /// Current underlying state
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// State as published, with the auth key overlay applied
    pub fn reported_state(&self) -> ConnectionState {
        if self.check_auth_key {
            ConnectionState::CheckAuthKey
        } else {
            self.state
        }
    }

    pub fn check_auth_key(&self) -> bool {
        self.check_auth_key
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn supervisor(&self) -> &S {
        &self.supervisor
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Run one control cycle started at `now`
    ///
    /// Never fails: every problem is logged and the next cycle retries.
    pub fn run_cycle(&mut self, now: Instant) -> PublishedStatus {
        match self.bus.read_settings() {
            Ok(settings) => self.settings = Some(settings),
            Err(e) if self.settings.is_some() => warn!("keeping previous settings: {}", e),
            Err(e) => warn!("no settings read yet, leaving tailscale alone: {}", e),
        }
        // Without settings we cannot tell enabled from disabled; touching
        // the backend now could cut remote access
        let Some(settings) = self.settings.clone() else {
            return self.publish(String::new());
        };

        self.hostname.observe(settings.system_name.as_deref());

        let liveness = self.supervisor.liveness();

        // Uses last cycle's state: forwarding follows the published
        // connection, not the one this cycle may establish
        let forwarding = settings.enabled
            && self.state == ConnectionState::Connected
            && settings.exit_node_requested();
        let tailscale = TailscaleCli::new(&self.runner, &self.paths.tailscale);
        self.forwarding
            .update(forwarding, &self.runner, &self.paths.sysctl, &tailscale);

        let mut running = liveness == Liveness::Running;
        let mut starting = false;
        if settings.enabled && liveness == Liveness::NotRunning {
            info!("starting tailscale backend");
            if let Err(e) = self.supervisor.start() {
                error!("start tailscale backend failed: {}", e);
            }
            starting = true;
        } else if !settings.enabled && running {
            info!("stopping tailscale backend");
            if let Err(e) = self.supervisor.stop() {
                error!("stop tailscale backend failed: {}", e);
            }
            running = false;
        }

        let mut login_link = String::new();
        if running {
            self.drive_connection(now, &settings, &mut login_link);
        } else {
            self.state = if starting {
                ConnectionState::BackendStarting
            } else {
                ConnectionState::NotRunning
            };
            self.check_auth_key = false;
        }

        if !self.state.is_connected() {
            self.ipv4.clear();
            self.ipv6.clear();
            self.peer_hostname = None;
        }

        let status = self.publish(login_link);
        self.previous_state = self.state;
        status
    }

    fn publish(&self, login_link: String) -> PublishedStatus {
        let status = self.snapshot(login_link);
        if let Err(e) = self.bus.publish(&status) {
            error!("failed to publish status: {}", e);
        }
        status
    }

    /// Backend is running: handle triggers, poll status, act
    fn drive_connection(&mut self, now: Instant, settings: &Settings, login_link: &mut String) {
        let mut reset = false;

        match self.bus.take_gui_command() {
            Ok(Some(GuiCommand::Logout)) => {
                info!("logout command received");
                reset = true;
                self.last_response = Some(now);
            }
            Ok(Some(GuiCommand::Unknown(raw))) => warn!("ignoring unknown GUI command {:?}", raw),
            Ok(None) => {}
            Err(e) => warn!("could not read GUI command: {}", e),
        }

        let new_key = settings.auth_key.clone();
        // The first key seen is a baseline, not a change: a daemon restart
        // with a key already configured keeps the existing tailnet login
        // instead of forcing a logout and a fresh login with that key.
        if let Some(old_key) = &self.auth_key {
            if !new_key.is_empty() && &new_key != old_key {
                info!("new auth key detected");
                reset = true;
                self.check_auth_key = false;
            }
        }
        self.auth_key = Some(new_key.clone());

        let status = self.tailscale().status();
        let outcome = self.parser.classify(status.as_ref(), &new_key);
        self.apply_outcome(outcome, login_link);

        // A stall usually means no route to the coordination server or
        // a bad auth key
        if self.state == ConnectionState::WaitingForResponse && !new_key.is_empty() {
            if let Some(last) = self.last_response {
                if now.saturating_duration_since(last) >= RESPONSE_TIMEOUT {
                    error!("timeout waiting for response from tailscale - check auth key");
                    reset = true;
                    self.check_auth_key = true;
                }
            }
        } else {
            self.last_response = Some(now);
        }

        if reset {
            self.force_logout(&new_key);
        } else if self.state == ConnectionState::Stopped {
            info!(
                "starting tailscale (hostname {:?}, auth key {})",
                self.hostname.label(),
                new_key.masked()
            );
            let out = self.tailscale().up(self.hostname.label(), &new_key);
            self.handshake_result("up", out);
        } else if self.state == ConnectionState::LoggedOut {
            info!(
                "logging in to tailscale (hostname {:?}, auth key {})",
                self.hostname.label(),
                new_key.masked()
            );
            let out = self.tailscale().login(self.hostname.label(), &new_key);
            self.handshake_result("login", out);
        }

        if self.state.is_connected() {
            if self.previous_state != ConnectionState::Connected {
                info!("connection successful");
            }
            self.refresh_addresses();
        }
    }

    fn apply_outcome(&mut self, outcome: StatusOutcome, login_link: &mut String) {
        match outcome {
            StatusOutcome::NoResponse => {
                error!("no response to status command");
                self.check_auth_key = false;
            }
            StatusOutcome::ConnectFailed => {
                self.state = ConnectionState::NotRunning;
                self.check_auth_key = false;
            }
            StatusOutcome::Stopped => self.state = ConnectionState::Stopped,
            StatusOutcome::AwaitingLogin { login_url } => {
                self.state = ConnectionState::ConnectWait;
                *login_link = login_url;
            }
            StatusOutcome::LoggedOut => {
                // Reported transiently while a login is being processed
                if self.previous_state != ConnectionState::WaitingForResponse {
                    self.state = ConnectionState::LoggedOut;
                }
            }
            StatusOutcome::ConnectedOk { lines } => {
                self.state = ConnectionState::Connected;
                self.check_auth_key = false;
                if let Some(name) = find_peer_hostname(&lines, &self.ipv4) {
                    self.peer_hostname = Some(name);
                }
            }
            StatusOutcome::Unrecognized => {}
        }
    }

    /// Log out so a fresh login can be made; an auth key set in the
    /// settings makes that login automatic
    fn force_logout(&mut self, auth_key: &AuthKey) {
        if auth_key.is_empty() {
            info!("resetting connection for manual connection");
        } else {
            info!("resetting connection for auth key {}", auth_key.masked());
        }

        self.state = ConnectionState::WaitingForResponse;

        // Logout has no timeout flag and can take a while
        let feedback = PublishedStatus {
            state: ConnectionState::WaitingForResponse.code(),
            ..PublishedStatus::default()
        };
        if let Err(e) = self.bus.publish(&feedback) {
            warn!("failed to publish logout feedback: {}", e);
        }

        match self.tailscale().logout() {
            Some(out) if out.success() => self.state = ConnectionState::LoggedOut,
            Some(out) => {
                error!("tailscale logout failed {:?}", out.exit_code);
                error!("{}", out.stderr);
            }
            None => error!("tailscale logout could not be run"),
        }
    }

    fn handshake_result(&mut self, command: &str, out: Option<CommandOutput>) {
        match out {
            Some(out) if handshake_accepted(&out) => {
                self.state = ConnectionState::WaitingForResponse;
            }
            Some(out) => {
                error!("tailscale {} failed {:?}", command, out.exit_code);
                error!("{}", out.stderr);
            }
            None => error!("tailscale {} could not be run", command),
        }
    }

    fn refresh_addresses(&mut self) {
        let (ipv4, ipv6) = match self.tailscale().ip() {
            Some(out) => {
                if !out.success() {
                    error!("tailscale ip failed {:?}", out.exit_code);
                    error!("{}", out.stderr);
                }
                parse_ip_output(&out.stdout)
            }
            None => parse_ip_output(""),
        };
        self.ipv4 = ipv4;
        self.ipv6 = ipv6;
    }

    fn tailscale(&self) -> TailscaleCli<'_, R> {
        TailscaleCli::new(&self.runner, &self.paths.tailscale)
    }

    fn snapshot(&self, login_link: String) -> PublishedStatus {
        let connected = self.state.is_connected();
        PublishedStatus {
            state: self.reported_state().code(),
            login_link,
            ipv4: if connected { self.ipv4.clone() } else { String::new() },
            ipv6: if connected { self.ipv6.clone() } else { String::new() },
            hostname: if connected {
                self.peer_hostname.clone().unwrap_or_default()
            } else {
                String::new()
            },
        }
    }
}
