//! Integration tests for config file resolution
//!
//! Tests cover:
//! - Priority of command line over environment
//! - Missing config files falling back to defaults
//! - Unparsable config files surfacing as configuration errors
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate SCINV_CONFIG are marked with #[serial].

use scinv_common::config::{resolve_config_source, ConfigSource, TomlConfig, CONFIG_ENV_VAR};
use scinv_common::Error;
use serial_test::serial;
use std::env;
use std::fs;
use tempfile::TempDir;

fn write_config(dir: &TempDir, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, body).unwrap();
    path
}

#[test]
#[serial]
fn test_cli_path_takes_precedence_over_env() {
    let dir = TempDir::new().unwrap();
    let cli = write_config(&dir, "cli.toml", "[logging]\nlevel = \"warn\"\n");
    let envp = write_config(&dir, "env.toml", "[logging]\nlevel = \"trace\"\n");
    env::set_var(CONFIG_ENV_VAR, &envp);

    let (config, source) = TomlConfig::load(Some(&cli)).unwrap();
    assert_eq!(source, ConfigSource::CommandLine(cli));
    assert_eq!(config.logging.level, "warn");

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_env_path_used_without_cli() {
    let dir = TempDir::new().unwrap();
    let envp = write_config(&dir, "env.toml", "[edit]\nbackup_suffix = \".orig\"\n");
    env::set_var(CONFIG_ENV_VAR, &envp);

    let (config, source) = TomlConfig::load(None).unwrap();
    assert_eq!(source, ConfigSource::Environment(envp));
    assert_eq!(config.edit.backup_suffix, ".orig");

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_dangling_env_path_is_not_fatal() {
    env::set_var(CONFIG_ENV_VAR, "/nonexistent/scinv/config.toml");

    let source = resolve_config_source(None);
    assert!(!matches!(source, ConfigSource::Environment(_)));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_missing_cli_path_falls_through() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.toml");
    env::remove_var(CONFIG_ENV_VAR);

    let (_, source) = TomlConfig::load(Some(&missing)).unwrap();
    assert!(!matches!(source, ConfigSource::CommandLine(_)));
}

#[test]
#[serial]
fn test_missing_cli_path_falls_through_to_env() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.toml");
    let envp = write_config(&dir, "env.toml", "[export]\ndelimiter = \";\"\n");
    env::set_var(CONFIG_ENV_VAR, &envp);

    let (config, source) = TomlConfig::load(Some(&missing)).unwrap();
    assert_eq!(source, ConfigSource::Environment(envp));
    assert_eq!(config.export.delimiter, ';');

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
fn test_unparsable_file_is_config_error() {
    let dir = TempDir::new().unwrap();
    let bad = write_config(&dir, "bad.toml", "[export\ndelimiter = ");
    let err = TomlConfig::load(Some(&bad)).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}
