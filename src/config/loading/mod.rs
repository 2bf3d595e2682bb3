mod file_creation;

use std::{fs, path::Path};

use tracing::{debug, info, instrument};

use super::{Config, ConfigPaths};
use crate::{MeteoError, Result};
use file_creation::create_default_config_file;

impl Config {
    /// Loads the configuration file at `path`.
    ///
    /// A missing file is created with the default configuration first.
    /// Missing sections and fields fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The configuration file cannot be created or read
    /// - The TOML content is invalid
    /// - The content does not match the configuration schema
    #[instrument]
    pub fn load(path: &Path) -> Result<Config> {
        if !path.exists() {
            info!("No configuration file found, creating default");
            create_default_config_file(path)?;
        }

        let content = fs::read_to_string(path).map_err(|e| MeteoError::io(e, path))?;
        let config = Self::parse(&content).map_err(|e| match e {
            MeteoError::TomlParseError { details, .. } => {
                MeteoError::toml_parse(details, Some(path))
            }
            other => other,
        })?;

        debug!(city = %config.state.city, "Configuration loaded");
        Ok(config)
    }

    /// Loads the configuration from the default location.
    ///
    /// # Errors
    /// Returns an error if the config directory cannot be determined or
    /// [`Config::load`] fails.
    pub fn load_default() -> Result<Config> {
        let path = ConfigPaths::main_config()?;
        Self::load(&path)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `MeteoError::TomlParseError` if the content is not valid TOML
    /// for this schema, or `MeteoError::ConfigValidation` if a value is out
    /// of range.
    pub fn parse(content: &str) -> Result<Config> {
        let config: Config =
            toml::from_str(content).map_err(|e| MeteoError::toml_parse(e, None))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values the schema alone cannot express.
    ///
    /// # Errors
    /// Returns `MeteoError::ConfigValidation` naming the offending section.
    pub fn validate(&self) -> Result<()> {
        if self.dispatch.high_water_mark == 0 {
            return Err(MeteoError::ConfigValidation {
                component: "dispatch".to_string(),
                details: "high_water_mark must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    /// Renders the configuration as TOML.
    ///
    /// # Errors
    /// Returns `MeteoError::SerializationError` if serialization fails.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| MeteoError::SerializationError {
            content_type: "config".to_string(),
            details: e.to_string(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::{ThemeMode, UnitSystem};

    #[test]
    fn parse_empty_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn parse_partial_state_section() {
        let config = Config::parse(
            r#"
[state]
city = "Paris"
unit = "imperial"
theme_mode = "dark"

[state.coordinates]
lat = 48.85
lon = 2.35

[state.extra]
favorites = ["Oslo", "Rome"]
"#,
        )
        .unwrap();

        assert_eq!(config.state.city, "Paris");
        assert_eq!(config.state.language, "en");
        assert_eq!(config.state.unit, UnitSystem::Imperial);
        assert_eq!(config.state.theme_mode, ThemeMode::Dark);
        assert_eq!(config.state.coordinates.map(|c| c.lat), Some(48.85));
        assert_eq!(
            config.state.extra.get("favorites"),
            Some(&serde_json::json!(["Oslo", "Rome"]))
        );
    }

    #[test]
    fn parse_rejects_unknown_unit() {
        let result = Config::parse("[state]\nunit = \"kelvin\"\n");
        assert!(matches!(result, Err(MeteoError::TomlParseError { .. })));
    }

    #[test]
    fn parse_rejects_zero_high_water_mark() {
        let result = Config::parse("[dispatch]\nhigh_water_mark = 0\n");
        assert!(matches!(
            result,
            Err(MeteoError::ConfigValidation { component, .. }) if component == "dispatch"
        ));
    }

    #[test]
    fn default_round_trips_through_toml() {
        let rendered = Config::default().to_toml().unwrap();
        assert_eq!(Config::parse(&rendered).unwrap(), Config::default());
    }
}
