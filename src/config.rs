//! Configuration management for the AI Weather application
//!
//! Settings come from an optional TOML file, overridden by `AIWEATHER_*`
//! environment variables (`__` separates nested keys). The result carries
//! the HTTP retry and cache policy and the chat backend settings.

use crate::WeatherError;
use crate::comfort::GigaChatConfig;
use crate::http::HttpClientConfig;
use crate::models::ForecastHorizon;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AiWeatherConfig {
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

/// Weather and geocoding API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Base URL for the forecast API
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    /// Base URL for the geocoding API
    #[serde(default = "default_geocoding_url")]
    pub geocoding_url: String,
    /// Per-attempt request timeout in seconds
    #[serde(default = "default_weather_timeout")]
    pub timeout_seconds: u32,
    /// Total attempts per request, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the first retry in milliseconds
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    /// Cap for a single retry delay in milliseconds
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,
}

/// Response cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cached response lifetime in seconds
    #[serde(default = "default_cache_ttl")]
    pub ttl_seconds: u64,
    /// Cache directory location
    #[serde(default = "default_cache_location")]
    pub location: String,
}

/// AI chat backend settings. Without credentials no comfort assessment is made.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    pub credentials: Option<String>,
    #[serde(default = "default_chat_auth_url")]
    pub auth_url: String,
    #[serde(default = "default_chat_api_url")]
    pub api_url: String,
    #[serde(default = "default_chat_scope")]
    pub scope: String,
    #[serde(default = "default_chat_model")]
    pub model: String,
    #[serde(default = "default_chat_timeout")]
    pub timeout_seconds: u32,
    /// PEM root certificate to trust for the chat endpoints
    #[serde(default)]
    pub ca_cert: Option<String>,
    /// Skip TLS verification for the chat endpoints
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Default application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Daily forecast horizon used when no settings file exists
    #[serde(default = "default_forecast_days")]
    pub forecast_days: u8,
}

// Default value functions
fn default_weather_base_url() -> String {
    "https://api.open-meteo.com/v1".to_string()
}

fn default_geocoding_url() -> String {
    "https://geocoding-api.open-meteo.com/v1".to_string()
}

fn default_weather_timeout() -> u32 {
    10
}

fn default_max_attempts() -> u32 {
    5
}

fn default_backoff_base_ms() -> u64 {
    200
}

fn default_backoff_max_ms() -> u64 {
    10_000
}

fn default_cache_ttl() -> u64 {
    3600
}

fn default_cache_location() -> String {
    "~/.cache/ai-weather".to_string()
}

fn default_chat_auth_url() -> String {
    "https://ngw.devices.sberbank.ru:9443/api/v2/oauth".to_string()
}

fn default_chat_api_url() -> String {
    "https://gigachat.devices.sberbank.ru/api/v1".to_string()
}

fn default_chat_scope() -> String {
    "GIGACHAT_API_PERS".to_string()
}

fn default_chat_model() -> String {
    "GigaChat".to_string()
}

fn default_chat_timeout() -> u32 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_forecast_days() -> u8 {
    7
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_weather_base_url(),
            geocoding_url: default_geocoding_url(),
            timeout_seconds: default_weather_timeout(),
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_max_ms: default_backoff_max_ms(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_cache_ttl(),
            location: default_cache_location(),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            credentials: None,
            auth_url: default_chat_auth_url(),
            api_url: default_chat_api_url(),
            scope: default_chat_scope(),
            model: default_chat_model(),
            timeout_seconds: default_chat_timeout(),
            ca_cert: None,
            accept_invalid_certs: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            forecast_days: default_forecast_days(),
        }
    }
}

impl AiWeatherConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment overrides, e.g. AIWEATHER_CHAT__CREDENTIALS
        builder = builder.add_source(
            Environment::with_prefix("AIWEATHER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: AiWeatherConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("ai-weather").join("config.toml"))
    }

    /// Apply default values to empty or zero fields
    pub fn apply_defaults(&mut self) {
        if self.weather.base_url.is_empty() {
            self.weather.base_url = default_weather_base_url();
        }
        if self.weather.geocoding_url.is_empty() {
            self.weather.geocoding_url = default_geocoding_url();
        }
        if self.weather.timeout_seconds == 0 {
            self.weather.timeout_seconds = default_weather_timeout();
        }
        if self.weather.max_attempts == 0 {
            self.weather.max_attempts = default_max_attempts();
        }
        if self.cache.ttl_seconds == 0 {
            self.cache.ttl_seconds = default_cache_ttl();
        }
        if self.cache.location.is_empty() {
            self.cache.location = default_cache_location();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.chat.credentials.as_deref().is_some_and(str::is_empty) {
            self.chat.credentials = None;
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.weather.timeout_seconds > 300 {
            return Err(WeatherError::config("Weather API timeout cannot exceed 300 seconds").into());
        }

        if !(1..=10).contains(&self.weather.max_attempts) {
            return Err(WeatherError::config("Weather API max attempts must be between 1 and 10").into());
        }

        if self.weather.backoff_base_ms > self.weather.backoff_max_ms {
            return Err(WeatherError::config(
                "Retry backoff base cannot exceed the backoff cap",
            )
            .into());
        }

        if self.cache.ttl_seconds > 7 * 24 * 3600 {
            return Err(WeatherError::config("Cache TTL cannot exceed 7 days").into());
        }

        if self.chat.timeout_seconds > 300 {
            return Err(WeatherError::config("Chat timeout cannot exceed 300 seconds").into());
        }

        ForecastHorizon::try_from(self.defaults.forecast_days)
            .map_err(|e| WeatherError::config(format!("defaults.forecast_days: {e}")))?;

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(WeatherError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(WeatherError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for (name, url) in [
            ("weather.base_url", &self.weather.base_url),
            ("weather.geocoding_url", &self.weather.geocoding_url),
            ("chat.auth_url", &self.chat.auth_url),
            ("chat.api_url", &self.chat.api_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(WeatherError::config(format!(
                    "{name} must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }

    /// Cache directory with a leading `~` expanded
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        expand_home(&self.cache.location)
    }

    /// Location of the persisted user settings
    #[must_use]
    pub fn settings_path(&self) -> PathBuf {
        self.cache_dir().join("settings.json")
    }

    /// Policy for the caching HTTP client
    #[must_use]
    pub fn http_client_config(&self) -> HttpClientConfig {
        HttpClientConfig {
            ttl: Duration::from_secs(self.cache.ttl_seconds),
            max_attempts: self.weather.max_attempts,
            backoff_base: Duration::from_millis(self.weather.backoff_base_ms),
            backoff_max: Duration::from_millis(self.weather.backoff_max_ms),
            timeout: Duration::from_secs(self.weather.timeout_seconds.into()),
            ..HttpClientConfig::default()
        }
    }

    /// Chat backend settings, if credentials are configured
    #[must_use]
    pub fn gigachat_config(&self) -> Option<GigaChatConfig> {
        let credentials = self.chat.credentials.clone()?;
        Some(GigaChatConfig {
            auth_url: self.chat.auth_url.clone(),
            api_url: self.chat.api_url.clone(),
            credentials,
            scope: self.chat.scope.clone(),
            model: self.chat.model.clone(),
            timeout: Duration::from_secs(self.chat.timeout_seconds.into()),
            ca_cert: self.chat.ca_cert.as_deref().map(expand_home),
            accept_invalid_certs: self.chat.accept_invalid_certs,
        })
    }
}

fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir().map_or_else(|| PathBuf::from(path), |home| home.join(rest)),
        None => PathBuf::from(path),
    }
}
