use std::path::PathBuf;
use std::time::Duration;

use openhands_acp::{config::GlobalConfig, AppError};

fn sample_toml(root: &str) -> String {
    format!(
        r#"
persistence_dir = '{root}'

[runtime]
command = "python"
args = ["-m", "openhands.runtime", "--stdio"]
startup_timeout_seconds = 45

[bridge]
event_buffer = 16
emit_metrics = false
"#
    )
}

#[test]
fn parses_full_config() {
    let config = GlobalConfig::from_toml_str(&sample_toml("/tmp/oh")).expect("valid config");

    assert_eq!(config.persistence_dir, PathBuf::from("/tmp/oh"));
    assert_eq!(config.runtime.command, "python");
    assert_eq!(config.runtime.args, vec!["-m", "openhands.runtime", "--stdio"]);
    assert_eq!(config.startup_timeout(), Duration::from_secs(45));
    assert_eq!(config.bridge.event_buffer, 16);
    assert!(!config.bridge.emit_metrics);
}

#[test]
fn empty_config_uses_defaults() {
    let config = GlobalConfig::from_toml_str("").expect("defaults are valid");

    assert_eq!(config, GlobalConfig::default());
    assert_eq!(config.runtime.command, "openhands-runtime");
    assert!(config.runtime.args.is_empty());
    assert_eq!(config.startup_timeout(), Duration::from_secs(30));
    assert_eq!(config.bridge.event_buffer, 64);
    assert!(config.bridge.emit_metrics);
}

#[test]
fn derived_paths_live_under_persistence_dir() {
    let config = GlobalConfig::from_toml_str(&sample_toml("/tmp/oh")).expect("valid config");

    assert_eq!(config.cache_dir(), PathBuf::from("/tmp/oh/cache/acp"));
    assert_eq!(config.mcp_config_path(), PathBuf::from("/tmp/oh/mcp.json"));
}

#[test]
fn zero_event_buffer_is_rejected() {
    let raw = "[bridge]\nevent_buffer = 0\n";

    match GlobalConfig::from_toml_str(raw) {
        Err(AppError::Config(msg)) => assert!(msg.contains("event_buffer"), "got: {msg}"),
        other => panic!("expected config error, got: {other:?}"),
    }
}

#[test]
fn zero_startup_timeout_is_rejected() {
    let raw = "[runtime]\nstartup_timeout_seconds = 0\n";

    match GlobalConfig::from_toml_str(raw) {
        Err(AppError::Config(msg)) => assert!(msg.contains("startup_timeout"), "got: {msg}"),
        other => panic!("expected config error, got: {other:?}"),
    }
}

#[test]
fn blank_runtime_command_is_rejected() {
    let raw = "[runtime]\ncommand = \"  \"\n";

    assert!(matches!(
        GlobalConfig::from_toml_str(raw),
        Err(AppError::Config(msg)) if msg.contains("runtime.command")
    ));
}

#[test]
fn invalid_toml_is_a_config_error() {
    match GlobalConfig::from_toml_str("[runtime\ncommand = 1") {
        Err(AppError::Config(msg)) => assert!(msg.starts_with("invalid config"), "got: {msg}"),
        other => panic!("expected config error, got: {other:?}"),
    }
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");

    let config =
        GlobalConfig::load_from_path(dir.path().join("absent.toml")).expect("defaults");

    assert_eq!(config, GlobalConfig::default());
}

#[test]
fn loads_from_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path().display().to_string();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, sample_toml(&root)).expect("write config");

    let config = GlobalConfig::load_from_path(&path).expect("valid config");

    assert_eq!(config.persistence_dir, dir.path());
    assert_eq!(config.runtime.startup_timeout_seconds, 45);
}
