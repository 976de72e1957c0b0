use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// All errors joined into one line
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Temperature sensor settings
    #[serde(default)]
    pub sensor: SensorConfig,

    /// Host loop settings
    #[serde(default)]
    pub host: HostConfig,
}

pub const DEFAULT_GEOLOCATION_URL: &str = "https://ipapi.co/json";
pub const DEFAULT_FORECAST_BASE_URL: &str = "https://api.met.no/weatherapi";
pub const DEFAULT_USER_AGENT: &str = concat!(
    "airtemp/",
    env!("CARGO_PKG_VERSION"),
    " (https://github.com/airtemp/airtemp)"
);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorConfig {
    /// Display label for the accessory
    #[serde(default = "default_sensor_name")]
    pub name: String,

    /// IP geolocation endpoint returning `{latitude, longitude}`
    #[serde(default = "default_geolocation_url")]
    pub geolocation_url: String,

    /// Base URL of the forecast API (without `/locationforecast/...`)
    #[serde(default = "default_forecast_base_url")]
    pub forecast_base_url: String,

    /// Product identifier sent to the forecast API.
    ///
    /// The forecast API rejects requests without an identifying User-Agent.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Transport timeout; the HTTP client default applies when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

fn default_sensor_name() -> String {
    "Air Temperature".to_string()
}

fn default_geolocation_url() -> String {
    DEFAULT_GEOLOCATION_URL.to_string()
}

fn default_forecast_base_url() -> String {
    DEFAULT_FORECAST_BASE_URL.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            name: default_sensor_name(),
            geolocation_url: default_geolocation_url(),
            forecast_base_url: default_forecast_base_url(),
            user_agent: default_user_agent(),
            request_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// How often the host reads the sensor, in seconds (default: 60)
    #[serde(default = "default_poll_seconds")]
    pub poll_seconds: u64,
}

fn default_poll_seconds() -> u64 {
    60
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            poll_seconds: default_poll_seconds(),
        }
    }
}

impl Config {
    /// Load configuration from the user config directory, creating a default
    /// file if none exists yet
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from an explicit path, creating it with defaults
    /// if missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(path).context("Failed to read config file")?;

        let config: Config =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Warnings are logged; errors fail the load.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()).into());
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(
            &self.sensor.geolocation_url,
            "sensor.geolocation_url",
            &mut result,
        );
        self.validate_url(
            &self.sensor.forecast_base_url,
            "sensor.forecast_base_url",
            &mut result,
        );

        if self.sensor.name.trim().is_empty() {
            result.add_warning("sensor.name", "Sensor name is empty");
        }

        if self.sensor.user_agent.trim().is_empty() {
            result.add_error(
                "sensor.user_agent",
                "User agent must identify the product to the forecast API",
            );
        }

        if self.sensor.request_timeout_secs == Some(0) {
            result.add_error(
                "sensor.request_timeout_secs",
                "Timeout must be greater than 0 (omit it to use the default)",
            );
        }

        if self.host.poll_seconds == 0 {
            result.add_error("host.poll_seconds", "Poll interval must be greater than 0");
        } else if self.host.poll_seconds < 10 {
            result.add_warning(
                "host.poll_seconds",
                "Poll interval under 10 seconds; the forecast only changes hourly",
            );
        }

        result
    }

    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
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

    /// Write configuration to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("airtemp");

        Ok(config_dir.join("config.toml"))
    }
}
