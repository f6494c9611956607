//! Location model for geographic coordinates and metadata

use serde::{Deserialize, Serialize};

/// Coordinate pair in decimal degrees
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinates {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}

impl Coordinates {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Format as a "lat, lon" string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }

    /// Round coordinates to the given number of decimals
    #[must_use]
    pub fn rounded(&self, precision: u32) -> (f64, f64) {
        let multiplier = 10_f64.powi(i32::try_from(precision).unwrap_or(4));
        let lat = (self.latitude * multiplier).round() / multiplier;
        let lon = (self.longitude * multiplier).round() / multiplier;
        (lat, lon)
    }

    /// Query parameters identifying this point for the forecast API.
    ///
    /// Rounded to four decimals (about 10 m) so that tiny geocoding jitter
    /// does not defeat the response cache.
    #[must_use]
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let (lat, lon) = self.rounded(4);
        vec![("latitude", lat.to_string()), ("longitude", lon.to_string())]
    }
}

/// A place name resolved to coordinates
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Place {
    /// The name as typed by the user (trimmed)
    pub query: String,
    /// Name reported by the geocoder
    pub name: String,
    /// Country reported by the geocoder
    pub country: Option<String>,
    pub coordinates: Coordinates,
}

impl Place {
    /// Display label, e.g. "Paris, France"
    #[must_use]
    pub fn label(&self) -> String {
        match &self.country {
            Some(country) => format!("{}, {}", self.name, country),
            None => self.name.clone(),
        }
    }
}
