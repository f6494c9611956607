//! Shared fixtures for the integration tests

#![allow(dead_code)]

use ai_weather::{CachingHttpClient, HttpClientConfig};
use serde_json::{Value, json};
use std::path::Path;
use std::time::Duration;
use wiremock::{Match, Request};

/// Matches requests whose query string carries `key`, whatever its value
pub struct HasQueryKey(pub &'static str);

impl Match for HasQueryKey {
    fn matches(&self, request: &Request) -> bool {
        request.url.query_pairs().any(|(key, _)| key == self.0)
    }
}

/// Client with millisecond backoff so retry tests stay fast
pub fn fast_client(cache_dir: &Path) -> CachingHttpClient {
    fast_client_with_ttl(cache_dir, Duration::from_secs(3600))
}

pub fn fast_client_with_ttl(cache_dir: &Path, ttl: Duration) -> CachingHttpClient {
    let config = HttpClientConfig {
        ttl,
        backoff_base: Duration::from_millis(1),
        backoff_max: Duration::from_millis(5),
        timeout: Duration::from_secs(5),
        ..HttpClientConfig::default()
    };
    CachingHttpClient::new(config, cache_dir).unwrap()
}

pub fn paris_geocoding() -> Value {
    json!({
        "results": [{
            "id": 2988507,
            "name": "Paris",
            "latitude": 48.85341,
            "longitude": 2.3488,
            "country": "France",
            "admin1": "Île-de-France"
        }],
        "generationtime_ms": 0.7
    })
}

pub fn current_fixture() -> Value {
    json!({
        "latitude": 48.86,
        "longitude": 2.34,
        "timezone": "Europe/Paris",
        "current": {
            "time": "2024-06-21T12:00",
            "temperature_2m": 15,
            "relative_humidity_2m": 60,
            "apparent_temperature": 14.2,
            "precipitation": 0.0,
            "windspeed_10m": 11.5,
            "winddirection_10m": 10,
            "cloudcover": 20,
            "weathercode": 0
        }
    })
}

/// Seven days starting 2024-06-21
pub fn daily_fixture() -> Value {
    let days: Vec<String> = (21..=27).map(|d| format!("2024-06-{d}")).collect();
    let sunrise: Vec<String> = days.iter().map(|d| format!("{d}T05:46")).collect();
    let sunset: Vec<String> = days.iter().map(|d| format!("{d}T21:58")).collect();
    json!({
        "latitude": 48.86,
        "longitude": 2.34,
        "daily": {
            "time": days,
            "weathercode": [0, 1, 2, 3, 61, 95, 1234],
            "temperature_2m_max": [25.0, 26.1, 24.3, 22.0, 19.5, 21.2, 23.4],
            "temperature_2m_min": [14.0, 15.2, 13.1, 12.0, 11.5, 12.2, 13.4],
            "apparent_temperature_max": [25.5, 26.0, 24.0, 21.0, 18.0, 20.0, 23.0],
            "apparent_temperature_min": [13.0, 14.0, 12.0, 11.0, 10.0, 11.0, 12.0],
            "precipitation_sum": [0.0, 0.0, 0.2, 1.0, 8.4, 12.0, 0.0],
            "precipitation_probability_max": [0, 5, 20, 40, 90, 80, 10],
            "windspeed_10m_max": [12.0, 14.0, 18.0, 20.0, 25.0, 30.0, 10.0],
            "winddirection_10m_dominant": [0, 90, 180, 270, 45, 225, 359],
            "sunrise": sunrise,
            "sunset": sunset,
            "uv_index_max": [7.5, 7.8, 6.0, 4.2, 2.0, 3.1, 6.6]
        }
    })
}

/// Daily block sized to `days`, for horizon changes
pub fn daily_fixture_for(days: u32) -> Value {
    let time: Vec<String> = (0..days)
        .map(|i| format!("2024-07-{:02}", i + 1))
        .collect();
    json!({
        "daily": {
            "time": time,
            "temperature_2m_max": vec![20.0; days as usize]
        }
    })
}

/// Hourly block with `hours` consecutive entries from 2024-06-21T00:00
pub fn hourly_fixture(hours: u32) -> Value {
    let time: Vec<String> = (0..hours)
        .map(|h| format!("2024-06-{:02}T{:02}:00", 21 + h / 24, h % 24))
        .collect();
    let temperature: Vec<f64> = (0..hours).map(|h| 10.0 + f64::from(h % 24) / 2.0).collect();
    json!({
        "hourly": {
            "time": time,
            "temperature_2m": temperature,
            "relative_humidity_2m": vec![70; hours as usize],
            "precipitation": vec![0.0; hours as usize],
            "cloudcover": vec![40; hours as usize],
            "windspeed_10m": vec![9.0; hours as usize],
            "visibility": vec![24140.0; hours as usize],
            "weathercode": vec![2; hours as usize],
            "soil_temperature_0cm": vec![16.0; hours as usize],
            "soil_temperature_6cm": vec![15.0; hours as usize],
            "soil_temperature_18cm": vec![14.0; hours as usize],
            "soil_temperature_54cm": vec![13.0; hours as usize]
        }
    })
}

pub fn chat_reply(content: &str) -> Value {
    json!({
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }],
        "model": "GigaChat",
        "object": "chat.completion"
    })
}
