use std::io::Write;
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::NamedTempFile;

/// Nothing listens here; any RPC attempt fails fast with connection refused.
const DEAD_RPC: &str = "http://127.0.0.1:1";

fn solsend(args: &[&str]) -> Output {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("solsend"));
    cmd.args(args)
        .arg("--rpc-url")
        .arg(DEAD_RPC)
        .env_remove("RUST_LOG");
    cmd.output().expect("failed to run solsend")
}

fn keypair_file() -> NamedTempFile {
    let bytes = ed25519_dalek::SigningKey::from_bytes(&[7; 32])
        .to_keypair_bytes()
        .to_vec();
    let mut file = NamedTempFile::new().expect("failed to create temp keypair");
    write!(file, "{}", serde_json::to_string(&bytes).unwrap()).expect("failed to write keypair");
    file.flush().expect("failed to flush keypair");
    file
}

/// Agent stderr must be exactly one JSON document, with no log lines around it.
fn parse_stderr_json(output: &Output) -> Value {
    let stderr = String::from_utf8(output.stderr.clone()).expect("stderr should be UTF-8");
    serde_json::from_str(stderr.trim())
        .unwrap_or_else(|err| panic!("stderr is not a single JSON payload ({err}): {stderr:?}"))
}

#[test]
fn agent_mode_without_force_requires_confirmation() {
    let keypair = keypair_file();
    let output = solsend(&[
        "--amount",
        "1",
        "--keypair",
        keypair.path().to_str().unwrap(),
        "--output",
        "json",
    ]);

    assert_eq!(output.status.code(), Some(2));
    let payload = parse_stderr_json(&output);
    assert_eq!(payload["error"], "confirmation_required");
    assert_eq!(payload["code"], 2);
    assert!(output.stdout.is_empty());
}

#[test]
fn non_positive_or_malformed_amounts_are_rejected_before_any_call() {
    let keypair = keypair_file();
    for amount in ["0", "abc", "-1", "0.0000000001"] {
        let output = solsend(&[
            "--amount",
            amount,
            "--keypair",
            keypair.path().to_str().unwrap(),
            "--output",
            "json",
            "--force",
        ]);

        assert_eq!(output.status.code(), Some(1), "amount {amount:?}");
        let payload = parse_stderr_json(&output);
        assert_eq!(payload["status"], "failed");
        assert_eq!(payload["code"], "E_INVALID_AMOUNT");
        assert!(payload.get("signature").is_none());
    }
}

#[test]
fn missing_keypair_reports_no_signer() {
    let output = solsend(&["--amount", "1", "--output", "json", "--force"]);

    assert_eq!(output.status.code(), Some(1));
    let payload = parse_stderr_json(&output);
    assert_eq!(payload["code"], "E_NO_SIGNER");
    assert_eq!(payload["title"], "Wallet not connected");
}

#[test]
fn unreachable_ledger_is_a_network_error() {
    let keypair = keypair_file();
    let output = solsend(&[
        "--amount",
        "0.5",
        "--keypair",
        keypair.path().to_str().unwrap(),
        "--output",
        "json",
        "--force",
    ]);

    assert_eq!(output.status.code(), Some(1));
    let payload = parse_stderr_json(&output);
    assert_eq!(payload["status"], "failed");
    assert_eq!(payload["code"], "E_NETWORK");
    assert!(payload.get("signature").is_none());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!stderr.contains('\u{1b}'), "agent stderr carries ANSI escapes: {stderr:?}");
    assert!(!stderr.contains("WARN"), "agent stderr carries log lines: {stderr:?}");
}

#[test]
fn malformed_keypair_file_is_a_setup_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "[1, 2, 3]").unwrap();
    file.flush().unwrap();

    let output = solsend(&[
        "--amount",
        "1",
        "--keypair",
        file.path().to_str().unwrap(),
        "--output",
        "json",
        "--force",
    ]);

    assert_eq!(output.status.code(), Some(1));
    let payload = parse_stderr_json(&output);
    assert_eq!(payload["error"], "setup_failed");
    assert!(payload["message"]
        .as_str()
        .map(|m| m.contains("64 bytes"))
        .unwrap_or(false));
}

#[test]
fn invalid_config_is_a_setup_error() {
    let mut config = NamedTempFile::new().unwrap();
    writeln!(config, "poll_interval_ms = 0").unwrap();
    config.flush().unwrap();

    let output = solsend(&[
        "--amount",
        "1",
        "--config",
        config.path().to_str().unwrap(),
        "--output",
        "json",
        "--force",
    ]);

    assert_eq!(output.status.code(), Some(1));
    let payload = parse_stderr_json(&output);
    assert_eq!(payload["error"], "setup_failed");
    assert!(payload["message"]
        .as_str()
        .map(|m| m.contains("poll_interval_ms"))
        .unwrap_or(false));
}
