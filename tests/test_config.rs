// ABOUTME: Tests for configuration resolution
// Checks the defaults, file and command-line layering

use pretty_assertions::assert_eq;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;
use termbridge::config::{BridgeConfig, ConfigOverrides, DEFAULT_URL};
use termbridge::BridgeError;

fn write_config(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("config.toml");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_defaults() {
    let config = BridgeConfig::default();
    assert_eq!(config.url, DEFAULT_URL);

    let policy = config.reconnect_policy();
    assert_eq!(policy.interval, Duration::from_secs(2));
    assert_eq!(policy.max_attempts, 10);
    assert_eq!(policy.connect_timeout, Duration::from_secs(5));
}

#[test]
fn test_file_values_override_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
url = "ws://calc.local:8080/socket"
max_reconnect_attempts = 3
"#,
    );

    let config = BridgeConfig::load(Some(&path), ConfigOverrides::default()).unwrap();
    assert_eq!(config.url, "ws://calc.local:8080/socket");
    assert_eq!(config.max_reconnect_attempts, 3);
    assert_eq!(config.reconnect_interval_ms, 2000);
}

#[test]
fn test_cli_overrides_beat_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "url = \"ws://from-file/socket\"\nreconnect_interval_ms = 100\n");

    let overrides = ConfigOverrides {
        url: Some("wss://from-cli/socket".to_string()),
        log_dir: Some(dir.path().join("logs")),
        ..ConfigOverrides::default()
    };
    let config = BridgeConfig::load(Some(&path), overrides).unwrap();

    assert_eq!(config.url, "wss://from-cli/socket");
    assert_eq!(config.reconnect_interval_ms, 100);
    assert_eq!(config.log_dir(), dir.path().join("logs"));
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let result = BridgeConfig::load(Some(&dir.path().join("nope.toml")), ConfigOverrides::default());
    assert!(matches!(result, Err(BridgeError::Config(_))));
}

#[test]
fn test_invalid_override_url_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "");
    let overrides = ConfigOverrides {
        url: Some("localhost:5000".to_string()),
        ..ConfigOverrides::default()
    };
    assert!(BridgeConfig::load(Some(&path), overrides).is_err());
}
