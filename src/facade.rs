//! Weather facade
//!
//! Holds the selected place and drives the fetches for it. A place must be
//! resolved before any forecast can be loaded; each fetch fails on its own
//! and leaves previously loaded data untouched.

use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::Result;
use crate::comfort::{ComfortAdvisor, GigaChatBackend};
use crate::config::AiWeatherConfig;
use crate::error::WeatherError;
use crate::http::CachingHttpClient;
use crate::location_resolver::LocationResolver;
use crate::models::{
    Coordinates, CurrentConditions, DailyForecastEntry, ForecastHorizon, HourlyForecastEntry,
    Place,
};
use crate::weather::ForecastProvider;

/// Lifecycle of the facade
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FacadeState {
    NoLocation,
    LocationResolved,
    DataLoaded,
}

/// Outcome of fetching everything at once; each part succeeds or fails alone
#[derive(Debug)]
pub struct ForecastBundle {
    pub current: Result<CurrentConditions>,
    pub daily: Result<Vec<DailyForecastEntry>>,
    pub hourly: Result<Vec<HourlyForecastEntry>>,
}

pub struct WeatherFacade {
    resolver: LocationResolver,
    provider: ForecastProvider,
    advisor: Option<ComfortAdvisor>,
    horizon: ForecastHorizon,
    place: Option<Place>,
    hourly: Option<Vec<HourlyForecastEntry>>,
    state: FacadeState,
}

impl WeatherFacade {
    #[must_use]
    pub fn new(
        resolver: LocationResolver,
        provider: ForecastProvider,
        advisor: Option<ComfortAdvisor>,
        horizon: ForecastHorizon,
    ) -> Self {
        Self {
            resolver,
            provider,
            advisor,
            horizon,
            place: None,
            hourly: None,
            state: FacadeState::NoLocation,
        }
    }

    /// Wire up the HTTP client, resolver, provider and, when chat
    /// credentials are configured, the comfort advisor.
    pub fn from_config(config: &AiWeatherConfig, horizon: ForecastHorizon) -> Result<Self> {
        let http = CachingHttpClient::new(config.http_client_config(), config.cache_dir())?;
        let resolver = LocationResolver::new(http.clone(), &config.weather.geocoding_url);
        let provider = ForecastProvider::new(http, &config.weather.base_url);

        let advisor = match config.gigachat_config() {
            Some(chat) => Some(ComfortAdvisor::new(Arc::new(GigaChatBackend::new(chat)?))),
            None => {
                debug!("No chat credentials configured, comfort assessment disabled");
                None
            }
        };

        Ok(Self::new(resolver, provider, advisor, horizon))
    }

    #[must_use]
    pub fn state(&self) -> FacadeState {
        self.state
    }

    #[must_use]
    pub fn place(&self) -> Option<&Place> {
        self.place.as_ref()
    }

    #[must_use]
    pub fn horizon(&self) -> ForecastHorizon {
        self.horizon
    }

    /// Most recently loaded hourly series for the current place
    #[must_use]
    pub fn hourly(&self) -> Option<&[HourlyForecastEntry]> {
        self.hourly.as_deref()
    }

    /// Resolve and select a place.
    ///
    /// On failure the previous selection and its data are kept.
    #[instrument(skip(self))]
    pub async fn set_place(&mut self, name: &str) -> Result<&Place> {
        let place = self.resolver.resolve(name).await?;
        info!("Selected {}", place.label());

        self.hourly = None;
        self.state = FacadeState::LocationResolved;
        Ok(self.place.insert(place))
    }

    /// Current conditions, with the comfort assessment when available
    #[instrument(skip(self))]
    pub async fn fetch_current(&mut self) -> Result<CurrentConditions> {
        let coords = self.coordinates()?;
        let current = self.load_current(&coords).await?;
        self.state = FacadeState::DataLoaded;
        Ok(current)
    }

    /// Daily forecast for `horizon`, which becomes the selected horizon
    #[instrument(skip(self))]
    pub async fn fetch_daily(
        &mut self,
        horizon: ForecastHorizon,
    ) -> Result<Vec<DailyForecastEntry>> {
        let coords = self.coordinates()?;
        let daily = self.provider.fetch_daily(&coords, horizon).await?;
        self.horizon = horizon;
        self.state = FacadeState::DataLoaded;
        Ok(daily)
    }

    /// Hourly forecast for the fixed seven-day window
    #[instrument(skip(self))]
    pub async fn fetch_hourly(&mut self) -> Result<Vec<HourlyForecastEntry>> {
        let coords = self.coordinates()?;
        let hourly = self.provider.fetch_hourly(&coords).await?;
        self.hourly = Some(hourly.clone());
        self.state = FacadeState::DataLoaded;
        Ok(hourly)
    }

    /// Switch the daily horizon and reload only the daily forecast
    pub async fn change_horizon(
        &mut self,
        horizon: ForecastHorizon,
    ) -> Result<Vec<DailyForecastEntry>> {
        debug!("Changing forecast horizon from {} to {}", self.horizon, horizon);
        self.fetch_daily(horizon).await
    }

    /// Fetch current, daily and hourly data concurrently.
    ///
    /// Fails only when no place is selected; otherwise every part carries
    /// its own outcome.
    #[instrument(skip(self))]
    pub async fn fetch_all(&mut self) -> Result<ForecastBundle> {
        let coords = self.coordinates()?;

        let (current, daily, hourly) = futures::join!(
            self.load_current(&coords),
            self.provider.fetch_daily(&coords, self.horizon),
            self.provider.fetch_hourly(&coords),
        );

        if let Ok(series) = &hourly {
            self.hourly = Some(series.clone());
        }
        if current.is_ok() || daily.is_ok() || hourly.is_ok() {
            self.state = FacadeState::DataLoaded;
        }

        Ok(ForecastBundle {
            current,
            daily,
            hourly,
        })
    }

    fn coordinates(&self) -> Result<Coordinates> {
        self.place
            .as_ref()
            .map(|place| place.coordinates)
            .ok_or_else(|| WeatherError::validation("No location selected"))
    }

    async fn load_current(&self, coords: &Coordinates) -> Result<CurrentConditions> {
        let mut current = self.provider.fetch_current(coords).await?;

        if let Some(advisor) = &self.advisor {
            match advisor.assess(&current).await {
                Ok(assessment) => current.apply_comfort(assessment),
                Err(e) => warn!("Returning conditions without comfort assessment: {e}"),
            }
        }
        Ok(current)
    }
}
