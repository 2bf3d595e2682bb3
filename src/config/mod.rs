//! Configuration schema definitions and loading.
//!
//! Holds the startup defaults for the state slots, logging and dispatch
//! settings. All configurations are serializable to/from TOML format.

mod dispatch;
mod general;
mod loading;
mod paths;
mod state;

pub use dispatch::DispatchConfig;
pub use general::{GeneralConfig, LogLevel};
pub use paths::ConfigPaths;
pub use state::{Coordinates, StateDefaults, ThemeMode, UnitSystem};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Main configuration structure for meteo.
///
/// Represents the complete configuration schema that can be loaded
/// from TOML files. All fields have sensible defaults.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
pub struct Config {
    /// General application settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Initial values of the shared state slots.
    #[serde(default)]
    pub state: StateDefaults,

    /// Observer dispatch settings.
    #[serde(default)]
    pub dispatch: DispatchConfig,
}

impl Config {
    /// JSON schema describing the configuration file.
    pub fn schema() -> schemars::Schema {
        schemars::schema_for!(Config)
    }
}
