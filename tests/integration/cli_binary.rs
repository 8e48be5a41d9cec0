//! Integration tests for the `serscope` binary
//!
//! Runs the compiled CLI against an isolated config directory.

use std::process::{Command, Output};
use tempfile::TempDir;

fn serscope(test_dir: &TempDir, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_serscope"))
        .args(args)
        .env("XDG_CONFIG_HOME", test_dir.path())
        .env("HOME", test_dir.path())
        .env("SERSCOPE_LOG", "off")
        .env_remove("SERSCOPE_AMQP__DEFAULT_CONTEXT")
        .env_remove("SERSCOPE_CHECKPOINT__DEFAULT_CONTEXT")
        .output()
        .expect("failed to run serscope binary")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

#[test]
fn test_contexts_lists_both_catalogs() {
    let test_dir = TempDir::new().unwrap();
    let output = serscope(&test_dir, &["contexts"]);
    assert!(output.status.success());

    let table = stdout(&output);
    for id in ["checkpoint", "p2p", "rpc-server", "rpc-client", "storage"] {
        assert!(table.contains(id), "missing {id} in\n{table}");
    }
}

#[test]
fn test_encode_then_decode() {
    let test_dir = TempDir::new().unwrap();
    for stack in ["checkpoint", "amqp"] {
        let encoded = serscope(&test_dir, &["encode", "--stack", stack, "hello world"]);
        assert!(encoded.status.success(), "encode failed for {stack}");
        let hex = stdout(&encoded);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));

        let decoded = serscope(&test_dir, &["decode", "--stack", stack, &hex]);
        assert!(decoded.status.success(), "decode failed for {stack}");
        assert_eq!(stdout(&decoded), "hello world");
    }
}

#[test]
fn test_decode_with_wrong_stack_fails() {
    let test_dir = TempDir::new().unwrap();
    let encoded = serscope(&test_dir, &["encode", "--stack", "checkpoint", "hello"]);
    let hex = stdout(&encoded);

    let decoded = serscope(&test_dir, &["decode", "--stack", "amqp", &hex]);
    assert!(!decoded.status.success());
    assert!(String::from_utf8_lossy(&decoded.stderr).contains("magic"));
}

#[test]
fn test_unknown_context_fails() {
    let test_dir = TempDir::new().unwrap();
    let output = serscope(
        &test_dir,
        &["encode", "--stack", "amqp", "--context", "gossip", "hello"],
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("gossip"));
}

#[test]
fn test_config_command_reflects_file() {
    let test_dir = TempDir::new().unwrap();
    let path = test_dir.path().join("custom.toml");
    std::fs::write(&path, "[amqp]\ndefault_context = \"storage\"\n").unwrap();

    let output = serscope(
        &test_dir,
        &["--config", path.to_str().unwrap(), "config"],
    );
    assert!(output.status.success());
    assert!(stdout(&output).contains("default_context = \"storage\""));
}
