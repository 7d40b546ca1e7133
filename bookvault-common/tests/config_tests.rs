//! Configuration loading tests
//!
//! - Missing TOML file falls back to defaults
//! - Unparsable TOML is an error
//! - Command-line overrides win over file values

use bookvault_common::config::{default_config_path, Config, ConfigOverrides};
use serial_test::serial;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_missing_file_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let config = Config::load(&dir.path().join("absent.toml")).unwrap();

    assert_eq!(config.database_path, PathBuf::from("bookvault.db"));
    assert_eq!(config.cover_cache_dir, PathBuf::from("cover_cache"));
    assert_eq!(config.server.port, 5001);
    assert_eq!(config.catalog.max_results, 20);
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_full_file_is_loaded() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
        database_path = "/srv/bookvault/books.db"
        cover_cache_dir = "/srv/bookvault/covers"

        [server]
        host = "127.0.0.1"
        port = 8080

        [catalog]
        base_url = "http://localhost:9999/volumes"
        max_results = 10
        isbn_max_results = 2

        [logging]
        level = "debug"
        "#,
    )
    .unwrap();

    let config = Config::load(&path).unwrap();

    assert_eq!(config.database_path, PathBuf::from("/srv/bookvault/books.db"));
    assert_eq!(config.cover_cache_dir, PathBuf::from("/srv/bookvault/covers"));
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.catalog.base_url, "http://localhost:9999/volumes");
    assert_eq!(config.catalog.max_results, 10);
    assert_eq!(config.catalog.isbn_max_results, 2);
    assert_eq!(config.logging.level, "debug");
    assert!(config.validate().is_ok());
}

#[test]
fn test_invalid_toml_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "database_path = [unterminated").unwrap();

    let result = Config::load(&path);
    assert!(result.is_err(), "Unparsable config should not silently fall back");
}

#[test]
fn test_overrides_take_priority() {
    let config = Config::from_toml_str("[server]\nport = 8080\n")
        .unwrap()
        .with_overrides(ConfigOverrides {
            port: Some(9090),
            database_path: Some(PathBuf::from("/tmp/override.db")),
            ..Default::default()
        });

    assert_eq!(config.server.port, 9090);
    assert_eq!(config.database_path, PathBuf::from("/tmp/override.db"));
    // Untouched values keep their file/default value
    assert_eq!(config.server.host, "0.0.0.0");
}

#[test]
#[serial]
fn test_default_config_path_uses_platform_config_dir() {
    let saved = std::env::var("XDG_CONFIG_HOME").ok();
    std::env::set_var("XDG_CONFIG_HOME", "/tmp/bookvault-xdg-test");

    let path = default_config_path();
    assert!(path.ends_with("bookvault/config.toml") || path.ends_with("bookvault.toml"));

    match saved {
        Some(value) => std::env::set_var("XDG_CONFIG_HOME", value),
        None => std::env::remove_var("XDG_CONFIG_HOME"),
    }
}
