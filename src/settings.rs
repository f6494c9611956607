//! Persisted user settings
//!
//! A small JSON document holding the preferred daily forecast horizon and
//! the display theme. Read once at startup, written whenever the user
//! changes either value.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::error::WeatherError;
use crate::models::ForecastHorizon;

/// Display theme preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    System,
    Light,
    Dark,
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Theme::System => "system",
            Theme::Light => "light",
            Theme::Dark => "dark",
        };
        f.write_str(name)
    }
}

impl FromStr for Theme {
    type Err = WeatherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "system" => Ok(Theme::System),
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(WeatherError::validation(format!(
                "unknown theme '{other}', expected system, light or dark"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub forecast_days: ForecastHorizon,
    #[serde(default)]
    pub theme: Theme,
}

/// On-disk shape with each key kept loose, so one bad value does not
/// discard the rest of the file
#[derive(Debug, Default, Deserialize)]
struct StoredSettings {
    forecast_days: Option<Value>,
    theme: Option<Value>,
}

fn key_or<T: DeserializeOwned>(key: &str, value: Option<Value>, fallback: T) -> T {
    let Some(value) = value else {
        return fallback;
    };
    match serde_json::from_value(value.clone()) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Ignoring invalid settings value {key}={value}: {e}");
            fallback
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::with_horizon(ForecastHorizon::default())
    }
}

impl Settings {
    #[must_use]
    pub fn with_horizon(forecast_days: ForecastHorizon) -> Self {
        Self {
            forecast_days,
            theme: Theme::default(),
        }
    }

    /// Load settings from `path`; a missing file yields `fallback`, and
    /// so does each missing or invalid key
    pub fn load_or(path: &Path, fallback: Settings) -> Result<Self> {
        if !path.exists() {
            debug!("No settings file at {}, using defaults", path.display());
            return Ok(fallback);
        }

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        let stored: StoredSettings = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid settings file {}", path.display()))?;
        Ok(Self {
            forecast_days: key_or("forecast_days", stored.forecast_days, fallback.forecast_days),
            theme: key_or("theme", stored.theme, fallback.theme),
        })
    }

    /// Load settings from `path`, falling back to the built-in defaults
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_or(path, Settings::default())
    }

    /// Write settings to `path`, creating parent directories as needed
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create settings directory {}", parent.display())
            })?;
        }

        let json = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write settings to {}", path.display()))?;
        info!("Saved settings to {}", path.display());
        Ok(())
    }
}
