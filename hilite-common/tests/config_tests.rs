//! Configuration resolution and graceful degradation tests
//!
//! Uses serial_test to prevent ENV variable race conditions: tests that
//! manipulate HILITE_CONFIG or HILITE_ANALYSIS_URL are marked #[serial].

use hilite_common::config::{
    load_toml_config, write_toml_config, ConfigOrigin, ConfigResolver, EngineSettings, LoggingConfig,
    TomlConfig, ANALYSIS_URL_ENV, CONFIG_PATH_ENV, DEFAULT_ANALYSIS_BASE_URL,
};
use serial_test::serial;
use std::env;
use tempfile::TempDir;

fn sample_config() -> TomlConfig {
    TomlConfig {
        analysis_base_url: Some("http://analysis.local:8080".to_string()),
        logging: LoggingConfig {
            level: "debug".to_string(),
            file: None,
        },
        engine: EngineSettings {
            min_comment_likes: 3,
            max_poll_attempts: 12,
            ..EngineSettings::default()
        },
    }
}

#[test]
fn test_write_then_load_preserves_values() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("config.toml");

    write_toml_config(&sample_config(), &path).unwrap();
    let loaded = load_toml_config(&path).unwrap();

    assert_eq!(
        loaded.analysis_base_url.as_deref(),
        Some("http://analysis.local:8080")
    );
    assert_eq!(loaded.logging.level, "debug");
    assert_eq!(loaded.engine.min_comment_likes, 3);
    assert_eq!(loaded.engine.max_poll_attempts, 12);
    assert_eq!(loaded.engine.comment_window_secs, 20.0);
}

#[test]
fn test_load_rejects_invalid_engine_settings() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "[engine]\nmax_poll_attempts = 0\n").unwrap();

    assert!(load_toml_config(&path).is_err());
}

#[test]
#[serial]
fn test_missing_file_degrades_to_defaults() {
    env::remove_var(CONFIG_PATH_ENV);
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("does-not-exist.toml");

    let resolver = ConfigResolver::new(Some(missing), None);
    let config = resolver.load();

    assert!(config.analysis_base_url.is_none());
    assert_eq!(config.engine, EngineSettings::default());
}

#[test]
#[serial]
fn test_corrupt_file_degrades_to_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "this is = = not toml").unwrap();

    let resolver = ConfigResolver::new(Some(path.clone()), None);
    let config = resolver.load();
    assert_eq!(config.logging.level, "info");

    let (config, origin) = resolver.resolve();
    assert_eq!(config.engine, EngineSettings::default());
    match origin {
        ConfigOrigin::Fallback { path: reported, reason } => {
            assert_eq!(reported, path);
            assert!(reason.contains("Parse TOML failed"), "reason: {}", reason);
        }
        other => panic!("expected fallback origin, got {:?}", other),
    }
}

#[test]
#[serial]
fn test_resolve_reports_file_origin() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    write_toml_config(&sample_config(), &path).unwrap();

    let (config, origin) = ConfigResolver::new(Some(path.clone()), None).resolve();
    assert_eq!(origin, ConfigOrigin::File(path));
    assert_eq!(config.engine.max_poll_attempts, 12);
}

#[test]
#[serial]
fn test_env_config_path_used_when_no_cli_arg() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("from-env.toml");
    write_toml_config(&sample_config(), &path).unwrap();

    env::set_var(CONFIG_PATH_ENV, &path);
    let resolver = ConfigResolver::new(None, None);
    assert_eq!(resolver.config_path(), Some(path.clone()));
    assert_eq!(resolver.load().engine.min_comment_likes, 3);
    env::remove_var(CONFIG_PATH_ENV);
}

#[test]
#[serial]
fn test_analysis_url_priority() {
    let toml_config = sample_config();

    // ENV beats TOML
    env::set_var(ANALYSIS_URL_ENV, "http://env:9");
    let resolver = ConfigResolver::new(None, None);
    assert_eq!(resolver.analysis_base_url(&toml_config), "http://env:9");

    // CLI beats ENV
    let resolver = ConfigResolver::new(None, Some("http://cli:1".to_string()));
    assert_eq!(resolver.analysis_base_url(&toml_config), "http://cli:1");

    // TOML when ENV absent
    env::remove_var(ANALYSIS_URL_ENV);
    let resolver = ConfigResolver::new(None, None);
    assert_eq!(
        resolver.analysis_base_url(&toml_config),
        "http://analysis.local:8080"
    );

    // Compiled default last
    assert_eq!(
        resolver.analysis_base_url(&TomlConfig::default()),
        DEFAULT_ANALYSIS_BASE_URL
    );
}
