//! IP forwarding / exit-node switching
//!
//! Acting as an exit node needs kernel forwarding for both address
//! families plus the matching tailscale flag.

use crate::vpn::command::CommandRunner;
use crate::vpn::tailscale::TailscaleCli;
use tracing::{error, info};

pub const IPV4_FORWARD_KEY: &str = "net.ipv4.ip_forward";
pub const IPV6_FORWARD_KEY: &str = "net.ipv6.conf.all.forwarding";

/// Remembers the last applied value so switches are only flipped on change
#[derive(Debug, Default)]
pub struct ForwardingState {
    /// None until the first application; the first cycle always applies
    applied: Option<bool>,
}

impl ForwardingState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `desired` if it differs from what was applied last.
    /// Returns true when commands were issued.
    pub fn update<R: CommandRunner>(
        &mut self,
        desired: bool,
        runner: &R,
        sysctl: &str,
        tailscale: &TailscaleCli<'_, R>,
    ) -> bool {
        if self.applied == Some(desired) {
            return false;
        }
        self.applied = Some(desired);

        if desired {
            info!("IP forwarding enabled");
        } else {
            info!("IP forwarding disabled");
        }

        let value = if desired { "1" } else { "0" };
        for key in [IPV4_FORWARD_KEY, IPV6_FORWARD_KEY] {
            let args = vec!["-w".to_string(), format!("{}={}", key, value)];
            match runner.run(sysctl, &args) {
                Some(out) if out.success() => {}
                Some(out) => error!(
                    "could not change {} to {} (exit {:?}): {}",
                    key, value, out.exit_code, out.stderr
                ),
                None => error!("could not change {} to {}: sysctl not runnable", key, value),
            }
        }

        match tailscale.set_exit_node(desired) {
            Some(out) if out.success() => {}
            Some(out) => error!(
                "could not change tailscale exit-node setting to {} (exit {:?}): {}",
                desired, out.exit_code, out.stderr
            ),
            None => error!("could not change tailscale exit-node setting to {}", desired),
        }

        true
    }
}
