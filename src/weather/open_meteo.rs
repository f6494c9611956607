//! `OpenMeteo` API response structures and conversion utilities
//!
//! Forecast responses expose parallel arrays under `current`/`daily`/`hourly`.
//! Every field array is optional and every element may be `null`; absent
//! values become `None` in the typed records rather than placeholders.

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, warn};

use super::semantics::{
    daylight_duration, parse_local_timestamp, weather_code_label, wind_direction_label,
};
use crate::Result;
use crate::error::WeatherError;
use crate::models::{Coordinates, CurrentConditions, DailyForecastEntry, HourlyForecastEntry, Place};

pub const CURRENT_FIELDS: &[&str] = &[
    "temperature_2m",
    "relative_humidity_2m",
    "apparent_temperature",
    "precipitation",
    "windspeed_10m",
    "winddirection_10m",
    "cloudcover",
    "weathercode",
];

pub const DAILY_FIELDS: &[&str] = &[
    "weathercode",
    "temperature_2m_max",
    "temperature_2m_min",
    "apparent_temperature_max",
    "apparent_temperature_min",
    "precipitation_sum",
    "precipitation_probability_max",
    "windspeed_10m_max",
    "winddirection_10m_dominant",
    "sunrise",
    "sunset",
    "uv_index_max",
];

pub const HOURLY_FIELDS: &[&str] = &[
    "temperature_2m",
    "relative_humidity_2m",
    "precipitation",
    "cloudcover",
    "windspeed_10m",
    "visibility",
    "weathercode",
    "soil_temperature_0cm",
    "soil_temperature_6cm",
    "soil_temperature_18cm",
    "soil_temperature_54cm",
];

type Series<T> = Option<Vec<Option<T>>>;

/// Forecast response from `OpenMeteo`
#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub timezone: Option<String>,
    pub current: Option<CurrentData>,
    pub daily: Option<DailyData>,
    pub hourly: Option<HourlyData>,
}

/// Current conditions block
#[derive(Debug, Deserialize)]
pub struct CurrentData {
    pub time: Option<String>,
    #[serde(rename = "temperature_2m")]
    pub temperature: Option<f64>,
    #[serde(rename = "relative_humidity_2m")]
    pub humidity: Option<f64>,
    pub apparent_temperature: Option<f64>,
    pub precipitation: Option<f64>,
    #[serde(rename = "windspeed_10m")]
    pub wind_speed: Option<f64>,
    #[serde(rename = "winddirection_10m")]
    pub wind_direction: Option<f64>,
    #[serde(rename = "cloudcover")]
    pub cloud_cover: Option<f64>,
    #[serde(rename = "weathercode")]
    pub weather_code: Option<i32>,
}

/// Daily parallel arrays
#[derive(Debug, Deserialize)]
pub struct DailyData {
    pub time: Vec<String>,
    #[serde(rename = "weathercode")]
    pub weather_code: Series<i32>,
    #[serde(rename = "temperature_2m_max")]
    pub temperature_max: Series<f64>,
    #[serde(rename = "temperature_2m_min")]
    pub temperature_min: Series<f64>,
    pub apparent_temperature_max: Series<f64>,
    pub apparent_temperature_min: Series<f64>,
    pub precipitation_sum: Series<f64>,
    pub precipitation_probability_max: Series<f64>,
    #[serde(rename = "windspeed_10m_max")]
    pub wind_speed_max: Series<f64>,
    #[serde(rename = "winddirection_10m_dominant")]
    pub wind_direction_dominant: Series<f64>,
    pub sunrise: Series<String>,
    pub sunset: Series<String>,
    pub uv_index_max: Series<f64>,
}

/// Hourly parallel arrays
#[derive(Debug, Deserialize)]
pub struct HourlyData {
    pub time: Vec<String>,
    #[serde(rename = "temperature_2m")]
    pub temperature: Series<f64>,
    #[serde(rename = "relative_humidity_2m")]
    pub humidity: Series<f64>,
    pub precipitation: Series<f64>,
    #[serde(rename = "cloudcover")]
    pub cloud_cover: Series<f64>,
    #[serde(rename = "windspeed_10m")]
    pub wind_speed: Series<f64>,
    pub visibility: Series<f64>,
    #[serde(rename = "weathercode")]
    pub weather_code: Series<i32>,
    pub soil_temperature_0cm: Series<f64>,
    pub soil_temperature_6cm: Series<f64>,
    pub soil_temperature_18cm: Series<f64>,
    pub soil_temperature_54cm: Series<f64>,
}

/// Geocoding response from `OpenMeteo`
#[derive(Debug, Deserialize)]
pub struct GeocodingResponse {
    pub results: Option<Vec<GeocodingResult>>,
}

#[derive(Debug, Deserialize)]
pub struct GeocodingResult {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub country: Option<String>,
    pub admin1: Option<String>,
}

impl GeocodingResult {
    #[must_use]
    pub fn into_place(self, query: &str) -> Place {
        Place {
            query: query.to_string(),
            name: self.name,
            country: self.country,
            coordinates: Coordinates::new(self.latitude, self.longitude),
        }
    }
}

fn at<T: Copy>(series: &Series<T>, index: usize) -> Option<T> {
    series.as_ref()?.get(index).copied().flatten()
}

fn at_str(series: &Series<String>, index: usize) -> Option<&str> {
    series.as_ref()?.get(index)?.as_deref()
}

fn label_code(code: Option<i32>) -> Option<String> {
    code.map(|c| weather_code_label(c).to_string())
}

fn label_wind(degrees: Option<f64>) -> Option<String> {
    degrees.map(|d| wind_direction_label(d).to_string())
}

/// Parse a forecast response body, failing only on structurally invalid JSON
pub fn parse_forecast(body: &str) -> Result<ForecastResponse> {
    serde_json::from_str(body)
        .map_err(|e| WeatherError::parse(format!("invalid OpenMeteo forecast response: {e}")))
}

impl CurrentData {
    /// Convert to current conditions; comfort fields stay unset
    #[must_use]
    pub fn into_conditions(self) -> CurrentConditions {
        CurrentConditions {
            observed_at: self.time.as_deref().and_then(parse_local_timestamp),
            temperature: self.temperature,
            feels_like: self.apparent_temperature,
            humidity: self.humidity,
            precipitation: self.precipitation,
            wind_speed: self.wind_speed,
            wind_direction_degrees: self.wind_direction,
            wind_direction_label: label_wind(self.wind_direction),
            cloud_cover: self.cloud_cover,
            weather_code: self.weather_code,
            weather_code_label: label_code(self.weather_code),
            comfort_score: None,
            advice: None,
        }
    }
}

impl DailyData {
    /// One entry per element of `time`, in the provider's order
    pub fn into_entries(self) -> Result<Vec<DailyForecastEntry>> {
        let mut entries = Vec::with_capacity(self.time.len());

        for (i, day) in self.time.iter().enumerate() {
            let date = NaiveDate::parse_from_str(day, "%Y-%m-%d")
                .map_err(|e| WeatherError::parse(format!("invalid daily time '{day}': {e}")))?;

            let sunrise = at_str(&self.sunrise, i).and_then(parse_local_timestamp);
            let sunset = at_str(&self.sunset, i).and_then(parse_local_timestamp);
            let daylight = match (sunrise, sunset) {
                (Some(rise), Some(set)) => Some(daylight_duration(rise, set)),
                _ => {
                    debug!("No sunrise/sunset pair for {day}");
                    None
                }
            };

            let wind_direction = at(&self.wind_direction_dominant, i);
            let weather_code = at(&self.weather_code, i);

            entries.push(DailyForecastEntry {
                date,
                temp_max: at(&self.temperature_max, i),
                temp_min: at(&self.temperature_min, i),
                apparent_temp_max: at(&self.apparent_temperature_max, i),
                apparent_temp_min: at(&self.apparent_temperature_min, i),
                precipitation_sum: at(&self.precipitation_sum, i),
                precipitation_probability: at(&self.precipitation_probability_max, i),
                wind_speed_max: at(&self.wind_speed_max, i),
                wind_direction_degrees: wind_direction,
                wind_direction_label: label_wind(wind_direction),
                sunrise,
                sunset,
                daylight_duration: daylight,
                uv_index_max: at(&self.uv_index_max, i),
                weather_code,
                weather_code_label: label_code(weather_code),
            });
        }

        Ok(entries)
    }
}

impl HourlyData {
    /// One entry per element of `time`, in the provider's order
    pub fn into_entries(self) -> Result<Vec<HourlyForecastEntry>> {
        let mut entries = Vec::with_capacity(self.time.len());

        for (i, hour) in self.time.iter().enumerate() {
            let Some(timestamp) = parse_local_timestamp(hour) else {
                warn!("Invalid hourly timestamp '{hour}'");
                return Err(WeatherError::parse(format!("invalid hourly time '{hour}'")));
            };
            let weather_code = at(&self.weather_code, i);

            entries.push(HourlyForecastEntry {
                timestamp,
                temperature: at(&self.temperature, i),
                humidity: at(&self.humidity, i),
                precipitation: at(&self.precipitation, i),
                cloud_cover: at(&self.cloud_cover, i),
                wind_speed: at(&self.wind_speed, i),
                visibility: at(&self.visibility, i),
                weather_code,
                weather_code_label: label_code(weather_code),
                soil_temperature_0cm: at(&self.soil_temperature_0cm, i),
                soil_temperature_6cm: at(&self.soil_temperature_6cm, i),
                soil_temperature_18cm: at(&self.soil_temperature_18cm, i),
                soil_temperature_54cm: at(&self.soil_temperature_54cm, i),
            });
        }

        Ok(entries)
    }
}
