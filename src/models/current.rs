//! Current conditions model

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// AI-derived comfort rating and clothing advice
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ComfortAssessment {
    /// Comfort score, 1 (awful) to 10 (excellent)
    pub score: u8,
    /// Free-text clothing advice, displayed verbatim
    pub advice: String,
}

/// Current weather conditions at a resolved location.
///
/// Provider fields are `None` when the provider omitted them. The comfort
/// fields are `None` when the AI backend was unavailable.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct CurrentConditions {
    /// Local observation time reported by the provider
    pub observed_at: Option<NaiveDateTime>,
    /// Temperature in Celsius
    pub temperature: Option<f64>,
    /// Apparent temperature in Celsius
    pub feels_like: Option<f64>,
    /// Relative humidity in percent
    pub humidity: Option<f64>,
    /// Precipitation in mm
    pub precipitation: Option<f64>,
    /// Wind speed at 10 m in km/h
    pub wind_speed: Option<f64>,
    /// Wind direction at 10 m in degrees (0 = North)
    pub wind_direction_degrees: Option<f64>,
    pub wind_direction_label: Option<String>,
    /// Total cloud cover in percent
    pub cloud_cover: Option<f64>,
    pub weather_code: Option<i32>,
    pub weather_code_label: Option<String>,
    pub comfort_score: Option<u8>,
    pub advice: Option<String>,
}

impl CurrentConditions {
    /// Attach an AI assessment
    pub fn apply_comfort(&mut self, assessment: ComfortAssessment) {
        self.comfort_score = Some(assessment.score);
        self.advice = Some(assessment.advice);
    }
}
