//! Tests for the daemontools supervisor over a scripted runner

mod common;

use common::ScriptedRunner;
use tsgx_core::error::CommandError;
use tsgx_core::vpn::{CommandOutput, Daemontools, Liveness, ServiceSupervisor};

const BACKEND: &str = "/service/TailscaleGX-backend";

fn backend(runner: &ScriptedRunner) -> Daemontools<&ScriptedRunner> {
    Daemontools::new(runner, "svstat", "svc", BACKEND)
}

#[test]
fn test_start_and_stop_use_svc() {
    let runner = ScriptedRunner::default();
    let supervisor = backend(&runner);

    assert_eq!(supervisor.start(), Ok(()));
    assert_eq!(
        runner.last_args("svc"),
        Some(vec!["-u".to_string(), BACKEND.to_string()])
    );

    assert_eq!(supervisor.stop(), Ok(()));
    assert_eq!(
        runner.last_args("svc"),
        Some(vec!["-d".to_string(), BACKEND.to_string()])
    );
}

#[test]
fn test_svc_failure_is_reported() {
    let runner = ScriptedRunner::default();
    runner.set(
        "svc",
        Some(CommandOutput::new("", "svc: warning: unable to control", 111)),
    );

    assert_eq!(
        backend(&runner).stop(),
        Err(CommandError::Failed {
            command: format!("svc -d {}", BACKEND),
            exit_code: Some(111),
            stderr: "svc: warning: unable to control".to_string(),
        })
    );
}

#[test]
fn test_svc_launch_failure() {
    let runner = ScriptedRunner::default();
    runner.set("svc", None);

    assert_eq!(
        backend(&runner).start(),
        Err(CommandError::LaunchFailed {
            command: format!("svc -u {}", BACKEND),
        })
    );
}

#[test]
fn test_liveness_from_svstat() {
    let runner = ScriptedRunner::default();
    let supervisor = backend(&runner);

    runner.set(
        "svstat",
        Some(CommandOutput::new(
            format!("{}: up (pid 812) 90 seconds", BACKEND),
            "",
            0,
        )),
    );
    assert_eq!(supervisor.liveness(), Liveness::Running);

    runner.set(
        "svstat",
        Some(CommandOutput::new(format!("{}: down 4 seconds", BACKEND), "", 0)),
    );
    assert_eq!(supervisor.liveness(), Liveness::NotRunning);

    runner.set(
        "svstat",
        Some(CommandOutput::new("", "unable to chdir: file does not exist", 111)),
    );
    assert_eq!(supervisor.liveness(), Liveness::Absent);

    runner.set("svstat", None);
    assert_eq!(supervisor.liveness(), Liveness::Absent);
}
