//! Data models for the AI Weather pipeline
//!
//! This module contains the core domain models organized by concern:
//! - Location: resolved place names and coordinates
//! - Current: current conditions enriched with the AI comfort assessment
//! - Forecast: daily and hourly forecast entries and the forecast horizon

pub mod current;
pub mod forecast;
pub mod location;

// Re-export all public types for convenient access
pub use current::{ComfortAssessment, CurrentConditions};
pub use forecast::{DailyForecastEntry, ForecastHorizon, HourlyForecastEntry};
pub use location::{Coordinates, Place};
