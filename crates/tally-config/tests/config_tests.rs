//! Configuration loading and precedence tests

use pretty_assertions::assert_eq;
use serial_test::serial;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tally_config::{ConfigError, ConfigLoader, ProjectConfig};
use tempfile::TempDir;

fn create_config_file(dir: &Path, content: &str) -> PathBuf {
    let config_path = dir.join("tally.toml");
    fs::write(&config_path, content).unwrap();
    config_path
}

fn loader(dir: &TempDir) -> ConfigLoader {
    ConfigLoader::new().with_global_config_path(dir.path().join("absent-global.toml"))
}

// ============================================================================
// Config Loading Tests
// ============================================================================

#[test]
#[serial]
fn test_load_full_project_config() {
    let temp_dir = TempDir::new().unwrap();
    create_config_file(
        temp_dir.path(),
        r#"
[runner]
poll_interval_ms = 15
exclude = ["std", "third_party"]

[output]
verbose = true
color = false
json = "/tmp/tally-results.json"
"#,
    );

    let config = loader(&temp_dir)
        .load_from_directory(temp_dir.path())
        .unwrap();

    assert_eq!(config.poll_interval(), Duration::from_millis(15));
    assert_eq!(
        config.excluded_prefixes(),
        Some(&["std".to_string(), "third_party".to_string()][..])
    );
    assert!(config.verbose());
    assert!(!config.color());
    assert_eq!(
        config.json_path(),
        Some(PathBuf::from("/tmp/tally-results.json"))
    );
}

#[test]
#[serial]
fn test_load_with_empty_config() {
    let temp_dir = TempDir::new().unwrap();
    create_config_file(temp_dir.path(), "");

    let config = loader(&temp_dir)
        .load_from_directory(temp_dir.path())
        .unwrap();

    // Empty config is valid (all fields optional)
    assert!(config.is_project());
    assert_eq!(config.poll_interval(), Duration::from_millis(10));
}

#[test]
#[serial]
fn test_load_from_nested_subdirectory_finds_root() {
    let temp_dir = TempDir::new().unwrap();
    create_config_file(temp_dir.path(), "[runner]\npoll_interval_ms = 7\n");

    let nested = temp_dir.path().join("a").join("b");
    fs::create_dir_all(&nested).unwrap();

    let config = loader(&temp_dir).load_from_directory(&nested).unwrap();

    assert_eq!(config.project_root(), Some(temp_dir.path()));
    assert_eq!(config.poll_interval(), Duration::from_millis(7));
}

// ============================================================================
// Invalid Config Tests
// ============================================================================

#[test]
#[serial]
fn test_invalid_toml_syntax() {
    let temp_dir = TempDir::new().unwrap();
    create_config_file(temp_dir.path(), "[runner\npoll_interval_ms = ");

    let result = loader(&temp_dir).load_from_directory(temp_dir.path());

    assert!(matches!(result, Err(ConfigError::TomlParseError { .. })));
}

#[test]
#[serial]
fn test_unknown_field_rejected() {
    let temp_dir = TempDir::new().unwrap();
    create_config_file(
        temp_dir.path(),
        r#"
[runner]
parallel = true
"#,
    );

    let result = loader(&temp_dir).load_from_directory(temp_dir.path());

    assert!(result.is_err());
}

#[test]
fn test_zero_poll_interval_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = create_config_file(temp_dir.path(), "[runner]\npoll_interval_ms = 0\n");

    let result = ProjectConfig::load_from_file(&path);

    assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
}

#[test]
fn test_missing_file_reports_not_found() {
    let temp_dir = TempDir::new().unwrap();

    let result = ProjectConfig::load_from_file(&temp_dir.path().join("tally.toml"));

    assert!(matches!(result, Err(ConfigError::NotFound(_))));
}

// ============================================================================
// Precedence Tests
// ============================================================================

#[test]
#[serial]
fn test_env_overrides_project_values() {
    let temp_dir = TempDir::new().unwrap();
    create_config_file(
        temp_dir.path(),
        r#"
[output]
verbose = false
"#,
    );

    env::set_var("TALLY_VERBOSE", "yes");
    env::set_var("TALLY_JSON", "/tmp/from-env.json");

    let config = loader(&temp_dir)
        .load_from_directory(temp_dir.path())
        .unwrap();

    env::remove_var("TALLY_VERBOSE");
    env::remove_var("TALLY_JSON");

    assert!(config.verbose());
    assert_eq!(config.json_path(), Some(PathBuf::from("/tmp/from-env.json")));
}
