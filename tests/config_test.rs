//! Integration tests for Settings layered loading.
//!
//! These tests only use explicit config files in temp directories, so the
//! global config (if any) only contributes values they do not assert on.
//! Environment overrides live in `config_env_test.rs`: that binary is the
//! only one touching `RSFOREST_*` variables.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use rsforest::application::ApplicationError;
use rsforest::config::{Settings, StoreBackend};

#[test]
fn given_explicit_config_when_loading_then_values_override_defaults() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("rsforest.toml");
    fs::write(
        &config_path,
        r#"
[store]
backend = "memory"

[output]
color = false
"#,
    )
    .unwrap();

    // Act
    let settings = Settings::load(Some(&config_path)).expect("load settings");

    // Assert
    assert_eq!(settings.store.backend, StoreBackend::Memory);
    assert!(!settings.output.color);
}

#[test]
fn given_tilde_store_path_when_loading_then_expanded() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("rsforest.toml");
    fs::write(
        &config_path,
        r#"
[store]
path = "~/forests/main.json"
"#,
    )
    .unwrap();

    // Act
    let settings = Settings::load(Some(&config_path)).expect("load settings");

    // Assert
    assert!(!settings.store.path.starts_with("~"));
    assert!(settings.store.path.ends_with(PathBuf::from("forests/main.json")));
}

#[test]
fn given_missing_explicit_config_when_loading_then_config_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.toml");

    let err = Settings::load(Some(&missing)).unwrap_err();

    assert!(matches!(err, ApplicationError::Config { .. }), "got {:?}", err);
}

#[test]
fn given_invalid_toml_when_loading_then_config_error() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("rsforest.toml");
    fs::write(&config_path, "[store\nbackend = ").unwrap();

    let err = Settings::load(Some(&config_path)).unwrap_err();

    assert!(matches!(err, ApplicationError::Config { .. }), "got {:?}", err);
}

#[test]
fn given_unknown_backend_when_loading_then_config_error() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("rsforest.toml");
    fs::write(&config_path, "[store]\nbackend = \"sqlite\"\n").unwrap();

    let err = Settings::load(Some(&config_path)).unwrap_err();

    assert!(matches!(err, ApplicationError::Config { .. }), "got {:?}", err);
}
