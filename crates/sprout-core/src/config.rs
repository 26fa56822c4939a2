use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;

/// Environment variable that overrides `weather.api_key`.
pub const WEATHER_API_KEY_ENV: &str = "SPROUT_WEATHER_API_KEY";

/// Default WeatherAPI.com endpoint root.
pub const DEFAULT_WEATHER_BASE_URL: &str = "https://api.weatherapi.com/v1";

/// One problem found in a setting.
#[derive(Debug, Clone)]
pub struct ConfigIssue {
    /// Dotted path of the setting, e.g. `weather.base_url`
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.field)
    }
}

/// Outcome of `Config::validate`. Errors stop startup; warnings only
/// disable a feature.
#[derive(Debug, Clone, Default)]
pub struct ConfigReport {
    pub errors: Vec<ConfigIssue>,
    pub warnings: Vec<ConfigIssue>,
}

impl ConfigReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(issue(field, message));
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(issue(field, message));
    }

    /// All errors on one line.
    pub fn error_summary(&self) -> String {
        let parts: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
        parts.join("; ")
    }
}

fn issue(field: impl Into<String>, message: impl Into<String>) -> ConfigIssue {
    ConfigIssue {
        field: field.into(),
        message: message.into(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application configuration directory
    pub config_dir: PathBuf,

    /// Local plant database
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Weather lookup settings
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Watering reminder settings
    #[serde(default)]
    pub reminders: RemindersConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database file name, relative to `config_dir` unless absolute
    #[serde(default = "default_database_file")]
    pub file: String,
}

fn default_database_file() -> String {
    "plants.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            file: default_database_file(),
        }
    }
}

/// Fixed coordinates used when weather is looked up "by location".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HomeLocation {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// WeatherAPI.com key (overridden by SPROUT_WEATHER_API_KEY)
    #[serde(default)]
    pub api_key: String,

    /// API root; `current.json` is appended
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,

    /// Ask the API for air-quality data (`aqi=yes`)
    #[serde(default)]
    pub air_quality: bool,

    /// Whether location-based lookups are permitted at all
    #[serde(default = "default_true")]
    pub location_enabled: bool,

    /// Coordinates reported as the device location
    #[serde(default)]
    pub home: Option<HomeLocation>,
}

fn default_weather_base_url() -> String {
    DEFAULT_WEATHER_BASE_URL.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_weather_base_url(),
            air_quality: false,
            location_enabled: true,
            home: None,
        }
    }
}

impl WeatherConfig {
    /// The API key, preferring the environment over the file.
    pub fn effective_api_key(&self) -> String {
        std::env::var(WEATHER_API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .unwrap_or_else(|| self.api_key.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemindersConfig {
    /// Post notifications when reminders fire
    #[serde(default = "default_true")]
    pub notifications_enabled: bool,

    /// User-visible channel name
    #[serde(default = "default_channel_name")]
    pub channel_name: String,

    /// User-visible channel description
    #[serde(default = "default_channel_description")]
    pub channel_description: String,
}

fn default_channel_name() -> String {
    "Plant Watering Reminders".to_string()
}

fn default_channel_description() -> String {
    "Notifications for plant watering schedules".to_string()
}

impl Default for RemindersConfig {
    fn default() -> Self {
        Self {
            notifications_enabled: true,
            channel_name: default_channel_name(),
            channel_description: default_channel_description(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sprout");

        Self {
            config_dir,
            database: DatabaseConfig::default(),
            weather: WeatherConfig::default(),
            reminders: RemindersConfig::default(),
        }
    }
}

impl Config {
    /// Read `<config dir>/sprout/config.toml`, writing the defaults there on first run.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Read an explicit config file, writing the defaults there if it is missing.
    /// Fresh defaults keep their data next to the file.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let mut config = Self::default();
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                config.config_dir = dir.to_path_buf();
            }
            config.save_to(path)?;
            tracing::info!("First run: default settings written to {}", path.display());
            return Ok(config);
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Unreadable(format!("{}: {}", path.display(), e)))?;
        let config = toml::from_str(&contents)
            .map_err(|e| ConfigError::Unreadable(format!("{}: {}", path.display(), e)))?;

        tracing::debug!("Loaded settings from {}", path.display());
        Ok(config)
    }

    /// `load()` followed by `validate()`.
    ///
    /// # Errors
    /// Fails with `ConfigError::Invalid` when any setting is an error;
    /// warnings are logged and returned with the config.
    pub fn load_validated() -> Result<(Self, ConfigReport)> {
        let config = Self::load()?;
        let report = config.validate();

        if !report.is_valid() {
            return Err(ConfigError::Invalid(report.error_summary()).into());
        }

        for warning in &report.warnings {
            tracing::warn!("Setting {}: {}", warning.field, warning.message);
        }

        Ok((config, report))
    }

    /// Check every setting without touching the filesystem or network.
    pub fn validate(&self) -> ConfigReport {
        let mut result = ConfigReport::default();

        if self.database.file.trim().is_empty() {
            result.add_error("database.file", "Database file name must not be empty");
        }

        self.validate_url(&self.weather.base_url, "weather.base_url", &mut result);

        if self.weather.effective_api_key().trim().is_empty() {
            result.add_warning(
                "weather.api_key",
                format!(
                    "No weather API key configured (set it here or in {}) - weather lookups will fail",
                    WEATHER_API_KEY_ENV
                ),
            );
        }

        if let Some(home) = self.weather.home {
            if !(-90.0..=90.0).contains(&home.latitude) {
                result.add_error("weather.home.latitude", "Latitude must be between -90 and 90");
            }
            if !(-180.0..=180.0).contains(&home.longitude) {
                result.add_error(
                    "weather.home.longitude",
                    "Longitude must be between -180 and 180",
                );
            }
        } else if self.weather.location_enabled {
            result.add_warning(
                "weather.home",
                "Location enabled but no coordinates set - weather by location is unavailable",
            );
        }

        if !self.reminders.notifications_enabled {
            result.add_warning(
                "reminders.notifications_enabled",
                "Notifications disabled - watering reminders will not be shown",
            );
        }

        result
    }

    /// Validate a URL field
    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ConfigReport) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Absolute path of the plant database
    pub fn database_path(&self) -> PathBuf {
        let file = PathBuf::from(&self.database.file);
        if file.is_absolute() {
            file
        } else {
            self.config_dir.join(file)
        }
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to an explicit file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let base = dirs::config_dir().context("No per-user config directory on this platform")?;
        Ok(base.join("sprout").join("config.toml"))
    }
}
