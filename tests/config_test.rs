//! Integration tests for Settings loading.
//!
//! These tests pass an explicit local config file, so the working directory's
//! `.rstree.toml` never takes part. Environment overrides are not exercised
//! here: tests run in parallel and share the process environment.

use std::fs;
use std::path::PathBuf;

use serde_json::json;
use tempfile::TempDir;

use rstree::application::ApplicationError;
use rstree::config::Settings;
use rstree::domain::GapPolicy;

fn write_config(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("rstree.toml");
    fs::write(&path, content).expect("write config");
    path
}

#[test]
fn given_local_config_when_load_then_overrides_defaults() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
data_dir = "/srv/trees"

[fields]
label = "translation.name"
root = "tree_id"

[adjacency]
cache_ttl_secs = 60

[adjacency.filter]
deleted = 0

[nested_set]
strict_bounds = true
gap_policy = "adopt"
"#,
    );

    // Act
    let settings = Settings::load(Some(&path)).expect("load settings");

    // Assert
    assert_eq!(settings.data_dir, PathBuf::from("/srv/trees"));
    assert_eq!(settings.fields.label, "translation.name");
    assert_eq!(settings.fields.root.as_deref(), Some("tree_id"));
    assert_eq!(settings.adjacency.cache_ttl_secs, 60);
    assert_eq!(settings.adjacency.filter.get("deleted"), Some(&json!(0)));
    assert!(settings.nested_set.strict_bounds);
    assert_eq!(settings.nested_set.gap_policy, GapPolicy::Adopt);
}

#[test]
fn given_partial_config_when_load_then_keeps_other_defaults() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[selection]\nselected_param = \"picked\"\n");

    // Act
    let settings = Settings::load(Some(&path)).expect("load settings");

    // Assert
    assert_eq!(settings.selection.selected_param, "picked");
    assert_eq!(settings.fields.left, "lft");
    assert_eq!(settings.adjacency.cache_key, "FullTree");
    assert!(settings.adjacency.cache_active);
}

#[test]
fn given_missing_config_file_when_load_then_config_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");

    let result = Settings::load(Some(&path));

    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_unknown_gap_policy_when_load_then_config_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[nested_set]\ngap_policy = \"sideways\"\n");

    let result = Settings::load(Some(&path));

    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_empty_sort_order_when_load_then_validation_fails() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[adjacency]\nsort_order = \"\"\n");

    // Act
    let result = Settings::load(Some(&path));

    // Assert
    match result {
        Err(ApplicationError::Config { message }) => assert!(message.contains("sort_order")),
        other => panic!("expected config error, got {other:?}"),
    }
}

#[test]
fn given_loaded_settings_when_rendered_as_toml_then_reloads_identically() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[fields]\nkind = \"type\"\n");
    let settings = Settings::load(Some(&path)).unwrap();

    // Act
    let rendered = settings.to_toml().unwrap();
    let reloaded = Settings::load(Some(&write_config(&dir, &rendered))).unwrap();

    // Assert
    assert_eq!(reloaded, settings);
}
