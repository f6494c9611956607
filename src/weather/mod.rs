//! Forecast retrieval from `OpenMeteo`
//!
//! Issues the current, daily and hourly queries through the caching client
//! and turns the responses into typed records.

use std::time::Instant;
use tracing::{info, instrument, warn};

use crate::Result;
use crate::error::WeatherError;
use crate::http::CachingHttpClient;
use crate::models::{
    Coordinates, CurrentConditions, DailyForecastEntry, ForecastHorizon, HourlyForecastEntry,
};

pub mod open_meteo;
pub mod semantics;

use open_meteo::{CURRENT_FIELDS, DAILY_FIELDS, HOURLY_FIELDS, parse_forecast};

/// Days covered by the hourly forecast, independent of the daily horizon
pub const HOURLY_FORECAST_DAYS: u8 = 7;

/// Client for the three forecast queries
#[derive(Clone)]
pub struct ForecastProvider {
    http: CachingHttpClient,
    forecast_url: String,
}

impl ForecastProvider {
    /// `base_url` is the API root, e.g. `https://api.open-meteo.com/v1`
    #[must_use]
    pub fn new(http: CachingHttpClient, base_url: &str) -> Self {
        Self {
            http,
            forecast_url: format!("{}/forecast", base_url.trim_end_matches('/')),
        }
    }

    /// Current conditions, without the AI comfort fields
    #[instrument(skip(self))]
    pub async fn fetch_current(&self, coords: &Coordinates) -> Result<CurrentConditions> {
        let started = Instant::now();
        let mut params = coords.query_params();
        params.push(("current", CURRENT_FIELDS.join(",")));
        params.push(("timezone", "auto".to_string()));

        let response = self
            .http
            .get(&self.forecast_url, &params, self.http.default_ttl())
            .await?;
        let forecast = parse_forecast(&response.body)?;
        let current = forecast
            .current
            .ok_or_else(|| WeatherError::parse("response has no 'current' block"))?;

        info!(
            "Current conditions for {} in {:.3}s (cached: {})",
            coords.format_coordinates(),
            started.elapsed().as_secs_f64(),
            response.from_cache
        );
        Ok(current.into_conditions())
    }

    /// Daily forecast for `horizon` days, in chronological order
    #[instrument(skip(self))]
    pub async fn fetch_daily(
        &self,
        coords: &Coordinates,
        horizon: ForecastHorizon,
    ) -> Result<Vec<DailyForecastEntry>> {
        let started = Instant::now();
        let mut params = coords.query_params();
        params.push(("daily", DAILY_FIELDS.join(",")));
        params.push(("timezone", "auto".to_string()));
        params.push(("forecast_days", horizon.days().to_string()));

        let response = self
            .http
            .get(&self.forecast_url, &params, self.http.default_ttl())
            .await?;
        let forecast = parse_forecast(&response.body)?;
        let daily = forecast
            .daily
            .ok_or_else(|| WeatherError::parse("response has no 'daily' block"))?;
        let entries = daily.into_entries()?;

        if entries.len() != usize::from(horizon.days()) {
            warn!(
                "Requested {} forecast days, provider returned {}",
                horizon.days(),
                entries.len()
            );
        }
        info!(
            "Daily forecast ({}) with {} entries in {:.3}s (cached: {})",
            horizon,
            entries.len(),
            started.elapsed().as_secs_f64(),
            response.from_cache
        );
        Ok(entries)
    }

    /// Hourly forecast for a fixed seven-day window.
    ///
    /// Usually 168 entries; a shorter series from the provider is returned
    /// as-is.
    #[instrument(skip(self))]
    pub async fn fetch_hourly(&self, coords: &Coordinates) -> Result<Vec<HourlyForecastEntry>> {
        let started = Instant::now();
        let mut params = coords.query_params();
        params.push(("hourly", HOURLY_FIELDS.join(",")));
        params.push(("timezone", "auto".to_string()));
        params.push(("forecast_days", HOURLY_FORECAST_DAYS.to_string()));

        let response = self
            .http
            .get(&self.forecast_url, &params, self.http.default_ttl())
            .await?;
        let forecast = parse_forecast(&response.body)?;
        let hourly = forecast
            .hourly
            .ok_or_else(|| WeatherError::parse("response has no 'hourly' block"))?;
        let entries = hourly.into_entries()?;

        let expected = usize::from(HOURLY_FORECAST_DAYS) * 24;
        if entries.len() < expected {
            warn!("Partial hourly data: {} of {} hours", entries.len(), expected);
        }
        info!(
            "Hourly forecast with {} entries in {:.3}s (cached: {})",
            entries.len(),
            started.elapsed().as_secs_f64(),
            response.from_cache
        );
        Ok(entries)
    }
}
