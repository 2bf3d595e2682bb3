//! Integration tests for configuration loading.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::panic))]

use std::fs;

use meteo::{
    MeteoError,
    config::{Config, UnitSystem},
    state::{StateManager, keys},
};
use serde_json::json;
use tempfile::TempDir;

fn write_config(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("meteo").join("config.toml");
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn missing_file_is_created_with_defaults() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("meteo").join("config.toml");

    let config = Config::load(&path).unwrap();

    assert_eq!(config, Config::default());
    let written = fs::read_to_string(&path).unwrap();
    assert!(written.starts_with("# meteo configuration file"));
    assert_eq!(Config::load(&path).unwrap(), Config::default());
}

#[test]
fn loads_state_defaults_from_file() {
    let temp = TempDir::new().unwrap();
    let path = write_config(
        &temp,
        r#"
[general]
log_level = "debug"

[state]
city = "Chicago"
unit = "imperial"
using_location = true

[dispatch]
high_water_mark = 16
"#,
    );

    let config = Config::load(&path).unwrap();

    assert_eq!(config.state.city, "Chicago");
    assert_eq!(config.state.unit, UnitSystem::Imperial);
    assert!(config.state.using_location);
    assert_eq!(config.dispatch.high_water_mark, 16);
    assert_eq!(config.general.log_level.to_string(), "debug");
}

#[test]
fn invalid_toml_reports_location() {
    let temp = TempDir::new().unwrap();
    let path = write_config(&temp, "[state\ncity = ");

    let error = Config::load(&path).unwrap_err();

    match error {
        MeteoError::TomlParseError { location, .. } => {
            assert!(location.ends_with("config.toml"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn zero_high_water_mark_is_rejected() {
    let temp = TempDir::new().unwrap();
    let path = write_config(&temp, "[dispatch]\nhigh_water_mark = 0\n");

    let error = Config::load(&path).unwrap_err();

    assert!(matches!(error, MeteoError::ConfigValidation { .. }));
    assert!(error.to_string().contains("high_water_mark"));
}

#[test]
fn schema_describes_state_section() {
    let schema = serde_json::to_value(Config::schema()).unwrap();
    let rendered = schema.to_string();

    assert!(rendered.contains("state"));
    assert!(rendered.contains("high_water_mark"));
}

#[tokio::test]
async fn manager_starts_from_configured_slots() {
    let temp = TempDir::new().unwrap();
    let path = write_config(
        &temp,
        r#"
[state]
city = "Oslo"
language = "no"

[state.coordinates]
lat = 59.91
lon = 10.75

[state.extra]
favorites = ["Bergen"]
"#,
    );
    let config = Config::load(&path).unwrap();

    let state = StateManager::from_config(&config).unwrap();

    assert_eq!(state.get_state(keys::CITY), Some(json!("Oslo")));
    assert_eq!(state.get_state(keys::LANGUAGE), Some(json!("no")));
    assert_eq!(state.get_state(keys::THEME_MODE), Some(json!("light")));
    assert_eq!(
        state.get_state(keys::COORDINATES),
        Some(json!({"lat": 59.91, "lon": 10.75}))
    );
    assert_eq!(state.get_state("favorites"), Some(json!(["Bergen"])));
    assert_eq!(state.snapshot().len(), keys::SLOTS.len() + 1);
}

#[tokio::test]
async fn unset_coordinates_leave_the_slot_absent() {
    let state = StateManager::from_config(&Config::default()).unwrap();

    assert_eq!(state.get_state(keys::COORDINATES), None);
    assert_eq!(state.snapshot().len(), keys::SLOTS.len() - 1);
}
