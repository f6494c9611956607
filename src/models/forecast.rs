//! Daily and hourly forecast models

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::WeatherError;

/// Number of days of daily-granularity forecast
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(try_from = "u8", into = "u8")]
pub enum ForecastHorizon {
    #[default]
    Week,
    TenDays,
    SixteenDays,
}

impl ForecastHorizon {
    pub const ALL: [ForecastHorizon; 3] = [Self::Week, Self::TenDays, Self::SixteenDays];

    #[must_use]
    pub fn days(self) -> u8 {
        match self {
            ForecastHorizon::Week => 7,
            ForecastHorizon::TenDays => 10,
            ForecastHorizon::SixteenDays => 16,
        }
    }
}

impl TryFrom<u8> for ForecastHorizon {
    type Error = WeatherError;

    fn try_from(days: u8) -> Result<Self, Self::Error> {
        match days {
            7 => Ok(Self::Week),
            10 => Ok(Self::TenDays),
            16 => Ok(Self::SixteenDays),
            other => Err(WeatherError::validation(format!(
                "forecast horizon must be 7, 10 or 16 days, got {other}"
            ))),
        }
    }
}

impl From<ForecastHorizon> for u8 {
    fn from(horizon: ForecastHorizon) -> Self {
        horizon.days()
    }
}

impl fmt::Display for ForecastHorizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} days", self.days())
    }
}

/// One forecast day
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DailyForecastEntry {
    pub date: NaiveDate,
    /// Maximum temperature in Celsius
    pub temp_max: Option<f64>,
    /// Minimum temperature in Celsius
    pub temp_min: Option<f64>,
    pub apparent_temp_max: Option<f64>,
    pub apparent_temp_min: Option<f64>,
    /// Precipitation sum in mm
    pub precipitation_sum: Option<f64>,
    /// Maximum precipitation probability in percent
    pub precipitation_probability: Option<f64>,
    /// Maximum wind speed in km/h
    pub wind_speed_max: Option<f64>,
    /// Dominant wind direction in degrees
    pub wind_direction_degrees: Option<f64>,
    pub wind_direction_label: Option<String>,
    pub sunrise: Option<NaiveDateTime>,
    pub sunset: Option<NaiveDateTime>,
    /// `sunset - sunrise`; may be zero or negative, see `weather::semantics::daylight_duration`
    #[serde(with = "duration_seconds")]
    pub daylight_duration: Option<TimeDelta>,
    pub uv_index_max: Option<f64>,
    pub weather_code: Option<i32>,
    pub weather_code_label: Option<String>,
}

/// One forecast hour
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct HourlyForecastEntry {
    pub timestamp: NaiveDateTime,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub precipitation: Option<f64>,
    pub cloud_cover: Option<f64>,
    pub wind_speed: Option<f64>,
    /// Visibility in meters
    pub visibility: Option<f64>,
    pub weather_code: Option<i32>,
    pub weather_code_label: Option<String>,
    pub soil_temperature_0cm: Option<f64>,
    pub soil_temperature_6cm: Option<f64>,
    pub soil_temperature_18cm: Option<f64>,
    pub soil_temperature_54cm: Option<f64>,
}

mod duration_seconds {
    use chrono::TimeDelta;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<TimeDelta>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(delta) => serializer.serialize_some(&delta.num_seconds()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<TimeDelta>, D::Error> {
        let seconds = Option::<i64>::deserialize(deserializer)?;
        Ok(seconds.map(TimeDelta::seconds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(7, ForecastHorizon::Week)]
    #[case(10, ForecastHorizon::TenDays)]
    #[case(16, ForecastHorizon::SixteenDays)]
    fn test_supported_horizons(#[case] days: u8, #[case] expected: ForecastHorizon) {
        let horizon = ForecastHorizon::try_from(days).unwrap();
        assert_eq!(horizon, expected);
        assert_eq!(horizon.days(), days);
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(8)]
    #[case(14)]
    #[case(17)]
    fn test_unsupported_horizons(#[case] days: u8) {
        let err = ForecastHorizon::try_from(days).unwrap_err();
        assert!(matches!(err, WeatherError::Validation { .. }));
    }

    #[test]
    fn test_horizon_serializes_as_day_count() {
        let json = serde_json::to_string(&ForecastHorizon::TenDays).unwrap();
        assert_eq!(json, "10");
        let back: ForecastHorizon = serde_json::from_str("16").unwrap();
        assert_eq!(back, ForecastHorizon::SixteenDays);
        assert!(serde_json::from_str::<ForecastHorizon>("9").is_err());
    }

    #[test]
    fn test_daylight_duration_serializes_as_seconds() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 21).unwrap();
        let entry = DailyForecastEntry {
            date,
            temp_max: None,
            temp_min: None,
            apparent_temp_max: None,
            apparent_temp_min: None,
            precipitation_sum: None,
            precipitation_probability: None,
            wind_speed_max: None,
            wind_direction_degrees: None,
            wind_direction_label: None,
            sunrise: None,
            sunset: None,
            daylight_duration: Some(TimeDelta::hours(16)),
            uv_index_max: None,
            weather_code: None,
            weather_code_label: None,
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["daylight_duration"], 57_600);
        let back: DailyForecastEntry = serde_json::from_value(value).unwrap();
        assert_eq!(back, entry);
    }
}
