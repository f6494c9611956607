//! Translation of coded provider values into display values.
//!
//! Everything here is pure.

use chrono::{NaiveDateTime, TimeDelta};

/// Label returned for weather codes outside the known table
pub const UNKNOWN_WEATHER_CODE: &str = "Unknown";

/// Compass labels, clockwise from North in 22.5° steps
pub const COMPASS_LABELS: [&str; 16] = [
    "North",
    "North-northeast",
    "Northeast",
    "East-northeast",
    "East",
    "East-southeast",
    "Southeast",
    "South-southeast",
    "South",
    "South-southwest",
    "Southwest",
    "West-southwest",
    "West",
    "West-northwest",
    "Northwest",
    "North-northwest",
];

/// Provider timestamp format (local time, no offset)
pub const LOCAL_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Convert a wind direction in degrees to one of the 16 compass labels.
///
/// `index = round(degrees / 22.5) mod 16`, with ties rounding to the even
/// index. Negative and >= 360 inputs wrap.
#[must_use]
pub fn wind_direction_label(degrees: f64) -> &'static str {
    let steps = (degrees / 22.5).round_ties_even();
    // NaN saturates to 0 (North)
    let index = steps.rem_euclid(16.0) as usize % 16;
    COMPASS_LABELS[index]
}

/// Convert a provider weather code to a description
#[must_use]
pub fn weather_code_label(code: i32) -> &'static str {
    match code {
        0 => "Clear",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Fog",
        48 => "Depositing rime fog",
        51 => "Drizzle: light",
        53 => "Drizzle: moderate",
        55 => "Drizzle: dense",
        56 => "Freezing drizzle: light",
        57 => "Freezing drizzle: dense",
        61 => "Rain: slight",
        63 => "Rain: moderate",
        65 => "Rain: heavy",
        66 => "Freezing rain: light",
        67 => "Freezing rain: heavy",
        71 => "Snow fall: slight",
        73 => "Snow fall: moderate",
        75 => "Snow fall: heavy",
        77 => "Snow grains",
        80 => "Rain showers: slight",
        81 => "Rain showers: moderate",
        82 => "Rain showers: violent",
        85 => "Snow showers: slight",
        86 => "Snow showers: heavy",
        95 => "Thunderstorm: slight or moderate",
        96 => "Thunderstorm with hail: slight",
        99 => "Thunderstorm with hail: heavy",
        _ => UNKNOWN_WEATHER_CODE,
    }
}

/// Length of daylight between two same-day local timestamps.
///
/// Not clamped: if the provider reports `sunset` before `sunrise` the
/// result is negative.
#[must_use]
pub fn daylight_duration(sunrise: NaiveDateTime, sunset: NaiveDateTime) -> TimeDelta {
    sunset - sunrise
}

/// Parse a provider local timestamp such as `2024-06-21T05:47`
#[must_use]
pub fn parse_local_timestamp(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, LOCAL_TIMESTAMP_FORMAT).ok()
}

/// Render a duration as `H:MM:SS`, prefixed with `-` when negative
#[must_use]
pub fn format_duration(duration: TimeDelta) -> String {
    let total = duration.num_seconds();
    let sign = if total < 0 { "-" } else { "" };
    let total = total.unsigned_abs();
    format!(
        "{sign}{}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}
