//! Location Resolution Module
//!
//! Turns a free-text place name into coordinates via the `OpenMeteo`
//! geocoding API. Every call goes to the network; callers keep the result
//! for as long as the place stays selected.

use tracing::{debug, info, instrument, warn};

use crate::Result;
use crate::error::WeatherError;
use crate::http::CachingHttpClient;
use crate::models::Place;
use crate::weather::open_meteo::GeocodingResponse;

/// Service for resolving place names
#[derive(Clone)]
pub struct LocationResolver {
    http: CachingHttpClient,
    search_url: String,
}

impl LocationResolver {
    /// `geocoding_url` is the API root, e.g. `https://geocoding-api.open-meteo.com/v1`
    #[must_use]
    pub fn new(http: CachingHttpClient, geocoding_url: &str) -> Self {
        Self {
            http,
            search_url: format!("{}/search", geocoding_url.trim_end_matches('/')),
        }
    }

    /// Resolve a place name to its best geocoding match
    #[instrument(skip(self))]
    pub async fn resolve(&self, place_name: &str) -> Result<Place> {
        let name = validate_place_name(place_name)?;
        debug!("Geocoding location name: {}", name);

        let params = [
            ("name", name.to_string()),
            ("count", "1".to_string()),
            ("language", "en".to_string()),
            ("format", "json".to_string()),
        ];
        let body = self.http.get_fresh(&self.search_url, &params).await?;

        let response: GeocodingResponse = serde_json::from_str(&body).map_err(|e| {
            WeatherError::parse(format!("invalid geocoding response for '{name}': {e}"))
        })?;

        let Some(best) = response.results.and_then(|results| results.into_iter().next()) else {
            warn!("No results found for location '{}'", name);
            return Err(WeatherError::not_found(name));
        };

        let place = best.into_place(name);
        info!(
            "Resolved '{}' to {} ({})",
            name,
            place.label(),
            place.coordinates.format_coordinates()
        );
        Ok(place)
    }
}

/// Trim and reject empty place names
pub fn validate_place_name(place_name: &str) -> Result<&str> {
    let trimmed = place_name.trim();
    if trimmed.is_empty() {
        return Err(WeatherError::validation("Location cannot be empty"));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("\t\n")]
    fn test_empty_names_rejected(#[case] input: &str) {
        let err = validate_place_name(input).unwrap_err();
        assert!(matches!(err, WeatherError::Validation { .. }));
    }

    #[test]
    fn test_names_are_trimmed() {
        assert_eq!(validate_place_name("  Paris ").unwrap(), "Paris");
    }
}
