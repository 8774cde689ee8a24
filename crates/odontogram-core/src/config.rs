//! Runtime configuration.
//!
//! Resolved once when the host opens the core and passed down from there, so
//! environment variables are never read while editing.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::models::{Color, ModelError};

/// Environment variable naming the SQLite database file.
pub const ENV_DB_PATH: &str = "ODONTOGRAM_DB_PATH";
/// Environment variable for the color selected when the palette opens.
pub const ENV_DEFAULT_COLOR: &str = "ODONTOGRAM_DEFAULT_COLOR";
/// Environment variable for the initial custom swatch.
pub const ENV_CUSTOM_COLOR: &str = "ODONTOGRAM_CUSTOM_COLOR";

/// Database file used when no path is configured.
pub const DEFAULT_DB_FILE: &str = "odontogram.sqlite3";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("database path cannot be empty")]
    EmptyDatabasePath,

    #[error("invalid color in {variable}: {source}")]
    InvalidColor {
        variable: &'static str,
        #[source]
        source: ModelError,
    },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration for an odontogram core instance.
#[derive(Clone, Debug, PartialEq)]
pub struct OdontogramConfig {
    database_path: PathBuf,
    default_color: Color,
    custom_color: Color,
}

impl OdontogramConfig {
    /// Create a config with the stock palette.
    pub fn new(database_path: impl Into<PathBuf>) -> ConfigResult<Self> {
        let database_path = database_path.into();
        if database_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }

        Ok(Self {
            database_path,
            default_color: Color::presets()
                .into_iter()
                .next()
                .unwrap_or_else(Color::white),
            custom_color: Color::default_custom(),
        })
    }

    pub fn with_default_color(mut self, color: &str) -> ConfigResult<Self> {
        self.default_color = parse_color(ENV_DEFAULT_COLOR, color)?;
        Ok(self)
    }

    pub fn with_custom_color(mut self, color: &str) -> ConfigResult<Self> {
        self.custom_color = parse_color(ENV_CUSTOM_COLOR, color)?;
        Ok(self)
    }

    /// Read configuration from the process environment.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through a key lookup; unset keys take defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let path = lookup(ENV_DB_PATH).unwrap_or_else(|| DEFAULT_DB_FILE.to_string());
        let mut config = Self::new(path)?;

        if let Some(color) = lookup(ENV_DEFAULT_COLOR) {
            config = config.with_default_color(&color)?;
        }
        if let Some(color) = lookup(ENV_CUSTOM_COLOR) {
            config = config.with_custom_color(&color)?;
        }

        tracing::debug!(
            database = %config.database_path.display(),
            default_color = %config.default_color,
            "resolved odontogram configuration"
        );
        Ok(config)
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    pub fn default_color(&self) -> &Color {
        &self.default_color
    }

    pub fn custom_color(&self) -> &Color {
        &self.custom_color
    }
}

fn parse_color(variable: &'static str, value: &str) -> ConfigResult<Color> {
    Color::new(value).map_err(|source| ConfigError::InvalidColor { variable, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = OdontogramConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.database_path(), Path::new(DEFAULT_DB_FILE));
        assert_eq!(config.default_color().as_str(), "#F2FCE2");
        assert_eq!(config.custom_color().as_str(), "#000000");
    }

    #[test]
    fn test_overrides() {
        let config = OdontogramConfig::from_lookup(lookup_from(&[
            (ENV_DB_PATH, "/var/lib/clinic/odontogram.db"),
            (ENV_DEFAULT_COLOR, "#D3E4FD"),
            (ENV_CUSTOM_COLOR, "teal"),
        ]))
        .unwrap();
        assert_eq!(
            config.database_path(),
            Path::new("/var/lib/clinic/odontogram.db")
        );
        assert_eq!(config.default_color().as_str(), "#D3E4FD");
        assert_eq!(config.custom_color().as_str(), "teal");
    }

    #[test]
    fn test_rejects_empty_values() {
        assert_eq!(
            OdontogramConfig::from_lookup(lookup_from(&[(ENV_DB_PATH, "")])),
            Err(ConfigError::EmptyDatabasePath)
        );
        assert!(matches!(
            OdontogramConfig::from_lookup(lookup_from(&[(ENV_DEFAULT_COLOR, " ")])),
            Err(ConfigError::InvalidColor {
                variable: ENV_DEFAULT_COLOR,
                ..
            })
        ));
    }
}
