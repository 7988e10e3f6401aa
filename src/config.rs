//! Configuration loading
//!
//! Settings come from an optional TOML file in the platform config directory
//! (`~/.config/skycast/config.toml` on Linux) or an explicit path, followed
//! by environment overrides for the API key and base URL.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use directories::ProjectDirs;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::geolocation::IP_API_URL;
use crate::data::openweather::OPENWEATHER_BASE_URL;
use crate::data::{DisabledGeolocator, Geolocator, IpGeolocator, OpenWeatherClient, Units};
use crate::forecast::{ForecastLimits, DEFAULT_DAILY_LIMIT, DEFAULT_HOURLY_LIMIT};
use crate::session::WeatherService;

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "SKYCAST_API_KEY";
/// Fallback environment variable holding the API key
pub const FALLBACK_API_KEY_ENV: &str = "OPENWEATHER_API_KEY";
/// Environment variable overriding the API base URL
pub const BASE_URL_ENV: &str = "SKYCAST_BASE_URL";

const USER_AGENT: &str = concat!("skycast/", env!("CARGO_PKG_VERSION"));

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("No API key configured. Set SKYCAST_API_KEY or api_key in the config file")]
    MissingApiKey,

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Position lookup settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeolocationConfig {
    pub enabled: bool,
    pub url: String,
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: IP_API_URL.to_string(),
        }
    }
}

/// Application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// OpenWeatherMap API key
    pub api_key: Option<String>,
    pub base_url: String,
    /// Location loaded at startup when none is given
    pub default_location: String,
    pub units: Units,
    pub hourly_limit: usize,
    pub daily_limit: usize,
    /// Per-request timeout applied by the HTTP client
    pub request_timeout_secs: u64,
    pub geolocation: GeolocationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: OPENWEATHER_BASE_URL.to_string(),
            default_location: "London".to_string(),
            units: Units::Metric,
            hourly_limit: DEFAULT_HOURLY_LIMIT,
            daily_limit: DEFAULT_DAILY_LIMIT,
            request_timeout_secs: 10,
            geolocation: GeolocationConfig::default(),
        }
    }
}

impl Config {
    /// Default config file location, if a home directory is known
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "skycast").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Loads configuration from `explicit` or the default location, then
    /// applies environment overrides
    ///
    /// An explicit path must exist; a missing default file yields defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded config file");
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies environment overrides using `lookup` to read variables
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty(API_KEY_ENV).or_else(|| non_empty(FALLBACK_API_KEY_ENV)) {
            self.api_key = Some(key);
        }
        if let Some(url) = non_empty(BASE_URL_ENV) {
            self.base_url = url;
        }
    }

    /// Checks value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hourly_limit == 0 {
            return Err(ConfigError::Invalid("hourly_limit must be at least 1".to_string()));
        }
        if self.daily_limit == 0 {
            return Err(ConfigError::Invalid("daily_limit must be at least 1".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.default_location.trim().is_empty() {
            return Err(ConfigError::Invalid("default_location must not be empty".to_string()));
        }
        Ok(())
    }

    /// The configured API key
    pub fn api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey)
    }

    pub fn limits(&self) -> ForecastLimits {
        ForecastLimits {
            hourly: self.hourly_limit,
            daily: self.daily_limit,
        }
    }

    /// Builds the lookup service described by this configuration
    pub fn build_service(&self) -> Result<WeatherService, ConfigError> {
        let api_key = self.api_key()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(self.request_timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;

        let source = OpenWeatherClient::with_client(client.clone(), api_key)
            .with_base_url(self.base_url.as_str());
        let geolocator: Arc<dyn Geolocator> = if self.geolocation.enabled {
            Arc::new(IpGeolocator::new(client).with_url(self.geolocation.url.as_str()))
        } else {
            Arc::new(DisabledGeolocator)
        };

        Ok(WeatherService::new(Arc::new(source), geolocator, self.limits()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    fn write_config(contents: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let path = dir.path().join("config.toml");
        fs::write(&path, contents).expect("Failed to write config");
        (dir, path)
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.base_url, "https://api.openweathermap.org/data/2.5");
        assert_eq!(config.default_location, "London");
        assert_eq!(config.units, Units::Metric);
        assert_eq!(config.limits(), ForecastLimits { hourly: 8, daily: 5 });
        assert!(config.geolocation.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file_full() {
        let (_dir, path) = write_config(
            r#"
            api_key = "abc123"
            default_location = "Vancouver"
            units = "imperial"
            hourly_limit = 4
            daily_limit = 3
            request_timeout_secs = 5

            [geolocation]
            enabled = false
            "#,
        );

        let config = Config::from_file(&path).unwrap();

        assert_eq!(config.api_key().unwrap(), "abc123");
        assert_eq!(config.default_location, "Vancouver");
        assert_eq!(config.units, Units::Imperial);
        assert_eq!(config.limits(), ForecastLimits { hourly: 4, daily: 3 });
        assert_eq!(config.request_timeout_secs, 5);
        assert!(!config.geolocation.enabled);
        assert_eq!(config.geolocation.url, IP_API_URL);
    }

    #[test]
    fn test_from_file_partial_uses_defaults() {
        let (_dir, path) = write_config("units = \"imperial\"\n");

        let config = Config::from_file(&path).unwrap();

        assert_eq!(config.units, Units::Imperial);
        assert_eq!(config.default_location, "London");
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_from_file_invalid_toml() {
        let (_dir, path) = write_config("units = [not toml");
        assert!(matches!(Config::from_file(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_from_file_unknown_units() {
        let (_dir, path) = write_config("units = \"kelvin\"\n");
        assert!(matches!(Config::from_file(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(Config::load(Some(&missing)), Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_env_overrides_api_key_and_base_url() {
        let mut config = Config {
            api_key: Some("from-file".to_string()),
            ..Config::default()
        };

        config.apply_env(env(&[
            ("SKYCAST_API_KEY", "from-env"),
            ("SKYCAST_BASE_URL", "http://localhost:8080"),
        ]));

        assert_eq!(config.api_key().unwrap(), "from-env");
        assert_eq!(config.base_url, "http://localhost:8080");
    }

    #[test]
    fn test_env_fallback_api_key() {
        let mut config = Config::default();
        config.apply_env(env(&[("OPENWEATHER_API_KEY", "fallback")]));
        assert_eq!(config.api_key().unwrap(), "fallback");
    }

    #[test]
    fn test_empty_env_values_are_ignored() {
        let mut config = Config {
            api_key: Some("from-file".to_string()),
            ..Config::default()
        };
        config.apply_env(env(&[("SKYCAST_API_KEY", "  ")]));
        assert_eq!(config.api_key().unwrap(), "from-file");
    }

    #[test]
    fn test_missing_api_key() {
        let config = Config::default();
        assert!(matches!(config.api_key(), Err(ConfigError::MissingApiKey)));
        assert!(matches!(config.build_service(), Err(ConfigError::MissingApiKey)));
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        let config = Config {
            daily_limit: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = Config {
            request_timeout_secs: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_build_service_with_key() {
        let config = Config {
            api_key: Some("abc".to_string()),
            ..Config::default()
        };
        assert!(config.build_service().is_ok());
    }
}
