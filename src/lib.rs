//! `AI Weather` - weather conditions and forecasts with an AI comfort score
//!
//! This library resolves place names, fetches current, daily and hourly
//! forecasts through a caching, retrying HTTP client, and asks a chat
//! backend for a comfort score and clothing advice.

pub mod cache;
pub mod comfort;
pub mod config;
pub mod error;
pub mod facade;
pub mod http;
pub mod location_resolver;
pub mod models;
pub mod settings;
pub mod weather;

// Re-export core types for public API
pub use cache::PersistentCache;
pub use comfort::{ChatBackend, ChatSession, ComfortAdvisor, GigaChatBackend, GigaChatConfig};
pub use config::AiWeatherConfig;
pub use error::WeatherError;
pub use facade::{FacadeState, ForecastBundle, WeatherFacade};
pub use http::{CachingHttpClient, HttpClientConfig, HttpResponse};
pub use location_resolver::LocationResolver;
pub use models::{
    ComfortAssessment, Coordinates, CurrentConditions, DailyForecastEntry, ForecastHorizon,
    HourlyForecastEntry, Place,
};
pub use settings::{Settings, Theme};
pub use weather::ForecastProvider;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, WeatherError>;
