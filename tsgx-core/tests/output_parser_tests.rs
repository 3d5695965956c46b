// Unit tests for StatusParser and the ip/hostname helpers

use tsgx_core::types::AuthKey;
use tsgx_core::vpn::output_parser::{find_peer_hostname, parse_ip_output};
use tsgx_core::vpn::{CommandOutput, StatusOutcome, StatusParser};

fn classify(stdout: &str, stderr: &str, exit_code: i32, key: &str) -> StatusOutcome {
    let parser = StatusParser::new();
    let out = CommandOutput::new(stdout, stderr, exit_code);
    parser.classify(Some(&out), &AuthKey::new(key))
}

#[test]
fn test_no_result_is_no_response() {
    let parser = StatusParser::new();
    assert_eq!(
        parser.classify(None, &AuthKey::empty()),
        StatusOutcome::NoResponse
    );
}

#[test]
fn test_connect_failed_from_stderr() {
    let outcome = classify(
        "",
        "failed to connect to local tailscaled; it doesn't appear to be running",
        1,
        "",
    );
    assert_eq!(outcome, StatusOutcome::ConnectFailed);
}

#[test]
fn test_connect_failed_wins_over_stdout_markers() {
    let outcome = classify("Tailscale is stopped.", "failed to connect", 1, "");
    assert_eq!(outcome, StatusOutcome::ConnectFailed);
}

#[test]
fn test_stopped() {
    assert_eq!(classify("Tailscale is stopped.", "", 1, ""), StatusOutcome::Stopped);
}

#[test]
fn test_login_prompt_without_key() {
    let outcome = classify(
        "Logged out.\nLog in at: https://login.example/abc",
        "",
        1,
        "",
    );
    assert_eq!(
        outcome,
        StatusOutcome::AwaitingLogin {
            login_url: "https://login.example/abc".to_string()
        }
    );
}

#[test]
fn test_login_prompt_with_key_is_logged_out() {
    // With a key the login URL is irrelevant; `login` will use the key
    let outcome = classify(
        "Logged out.\nLog in at: https://login.example/abc",
        "",
        1,
        "tskey-auth-abc",
    );
    assert_eq!(outcome, StatusOutcome::LoggedOut);
}

#[test]
fn test_logged_out() {
    assert_eq!(classify("Logged out.", "", 1, ""), StatusOutcome::LoggedOut);
}

#[test]
fn test_exit_zero_is_connected() {
    let outcome = classify(
        "100.64.0.1  my-gx  user@  linux  -\n100.64.0.2  laptop  user@  macOS  -",
        "",
        0,
        "",
    );
    match outcome {
        StatusOutcome::ConnectedOk { lines } => {
            assert_eq!(lines.len(), 2);
            assert!(lines[0].contains("my-gx"));
        }
        other => panic!("Expected ConnectedOk, got {:?}", other),
    }
}

#[test]
fn test_nonzero_without_marker_is_unrecognized() {
    assert_eq!(
        classify("Starting...", "", 1, ""),
        StatusOutcome::Unrecognized
    );
}

#[test]
fn test_classification_is_idempotent() {
    let parser = StatusParser::new();
    let samples = [
        CommandOutput::new("Tailscale is stopped.", "", 1),
        CommandOutput::new("Logged out.\nLog in at: https://login.example/x", "", 1),
        CommandOutput::new("Logged out.", "", 1),
        CommandOutput::new("100.64.0.1  gx  user@  linux  -", "", 0),
        CommandOutput::new("", "failed to connect", 1),
        CommandOutput::new("???", "", 2),
    ];
    for key in [AuthKey::empty(), AuthKey::new("tskey-x")] {
        for sample in &samples {
            assert_eq!(
                parser.classify(Some(sample), &key),
                parser.classify(Some(sample), &key)
            );
        }
    }
}

#[test]
fn test_ip_output_two_lines() {
    let (v4, v6) = parse_ip_output("100.64.0.1\nfd7a:115c:a1e0::1");
    assert_eq!(v4, "100.64.0.1");
    assert_eq!(v6, "fd7a:115c:a1e0::1");
}

#[test]
fn test_ip_output_malformed() {
    for stdout in [
        "",
        "100.64.0.1",
        "100.64.0.1\nfd7a::1\nextra",
        "fd7a::1\n100.64.0.1",
        "not\naddresses",
    ] {
        assert_eq!(
            parse_ip_output(stdout),
            ("?".to_string(), "?".to_string()),
            "input {:?}",
            stdout
        );
    }
}

#[test]
fn test_peer_hostname_lookup() {
    let lines = vec![
        "100.64.0.2   laptop   user@  macOS  -".to_string(),
        "100.64.0.1   cerbo-gx user@  linux  -".to_string(),
    ];
    assert_eq!(
        find_peer_hostname(&lines, "100.64.0.1"),
        Some("cerbo-gx".to_string())
    );
    assert_eq!(find_peer_hostname(&lines, "?"), None);
}
