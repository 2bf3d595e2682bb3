use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::state::keys;

/// Initial values of the shared state slots.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct StateDefaults {
    /// City shown at startup.
    pub city: String,

    /// UI language code.
    pub language: String,

    /// Unit system for temperatures and wind speed.
    pub unit: UnitSystem,

    /// Light or dark theme.
    pub theme_mode: ThemeMode,

    /// Resolve the city from the device location instead of `city`.
    pub using_location: bool,

    /// Last known coordinates, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,

    /// Additional slots, created with the given values. An entry named after
    /// a built-in slot replaces that slot's default.
    pub extra: BTreeMap<String, Value>,
}

impl Default for StateDefaults {
    fn default() -> Self {
        Self {
            city: "Rome".to_string(),
            language: "en".to_string(),
            unit: UnitSystem::default(),
            theme_mode: ThemeMode::default(),
            using_location: false,
            coordinates: None,
            extra: BTreeMap::new(),
        }
    }
}

impl StateDefaults {
    /// Flattens the defaults into `(key, value)` slots.
    ///
    /// Unset coordinates produce no slot, so `coordinates` stays absent until
    /// first written.
    pub fn to_slots(&self) -> Vec<(String, Value)> {
        let mut slots = vec![
            (keys::CITY.to_string(), Value::from(self.city.as_str())),
            (keys::LANGUAGE.to_string(), Value::from(self.language.as_str())),
            (keys::UNIT.to_string(), Value::from(self.unit.as_str())),
            (keys::THEME_MODE.to_string(), Value::from(self.theme_mode.as_str())),
            (keys::USING_LOCATION.to_string(), Value::Bool(self.using_location)),
        ];

        if let Some(coordinates) = self.coordinates {
            slots.push((keys::COORDINATES.to_string(), json!(coordinates)));
        }

        slots.extend(
            self.extra
                .iter()
                .map(|(key, value)| (key.clone(), value.clone())),
        );
        slots
    }
}

/// Unit system for displayed measurements.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    /// Celsius, km/h.
    #[default]
    Metric,
    /// Fahrenheit, mph.
    Imperial,
}

impl UnitSystem {
    /// Slot value for this unit system.
    pub fn as_str(self) -> &'static str {
        match self {
            UnitSystem::Metric => "metric",
            UnitSystem::Imperial => "imperial",
        }
    }
}

/// Theme mode of the UI.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    /// Light theme.
    #[default]
    Light,
    /// Dark theme.
    Dark,
}

impl ThemeMode {
    /// Slot value for this theme mode.
    pub fn as_str(self) -> &'static str {
        match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
        }
    }
}

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Coordinates {
    /// Latitude, -90 to 90.
    pub lat: f64,
    /// Longitude, -180 to 180.
    pub lon: f64,
}
