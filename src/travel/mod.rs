//! Travel-time prediction pipeline.
//!
//! A random forest regressor over trip features (distance, time of day,
//! calendar flags, weather), with a versioned feature schema so persisted
//! models and request-time inputs always agree on column layout.

pub mod mock;
pub mod model;
pub mod schema;

pub use model::{PredictorContext, TrainConfig, TrainReport, TravelTimeModel};
pub use schema::FeatureSchema;

use crate::error::{PredecirError, Result};
use serde::{Deserialize, Serialize};

/// Weather condition affecting travel speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weather {
    /// No precipitation.
    Clear,
    /// Rain.
    Rain,
    /// Snow.
    Snow,
    /// Fog.
    Fog,
    /// Storm.
    Storm,
}

impl Weather {
    /// All conditions, ordered by numeric code.
    pub const ALL: [Weather; 5] = [
        Weather::Clear,
        Weather::Rain,
        Weather::Snow,
        Weather::Fog,
        Weather::Storm,
    ];

    /// Numeric code as stored in the feature matrix.
    #[must_use]
    pub fn code(&self) -> u8 {
        match self {
            Weather::Clear => 0,
            Weather::Rain => 1,
            Weather::Snow => 2,
            Weather::Fog => 3,
            Weather::Storm => 4,
        }
    }

    /// Parses a numeric code.
    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(usize::from(code)).copied()
    }

    /// Parses a snake-case label.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "clear" => Some(Weather::Clear),
            "rain" => Some(Weather::Rain),
            "snow" => Some(Weather::Snow),
            "fog" => Some(Weather::Fog),
            "storm" => Some(Weather::Storm),
            _ => None,
        }
    }

    /// Fraction of free-flow speed achievable in this condition.
    #[must_use]
    pub fn speed_factor(&self) -> f32 {
        match self {
            Weather::Clear => 1.0,
            Weather::Rain => 0.9,
            Weather::Snow => 0.7,
            Weather::Fog => 0.8,
            Weather::Storm => 0.6,
        }
    }
}

/// One trip's input features, validated before expansion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TravelFeatures {
    /// Trip distance in kilometers, must be positive.
    pub distance_km: f32,
    /// Day of week, 0 = Sunday through 6 = Saturday.
    pub day_of_week: u8,
    /// Hour of day, 0 through 23.
    pub hour_of_day: u8,
    /// Public holiday flag.
    pub is_holiday: bool,
    /// Rush hour flag.
    pub is_rush_hour: bool,
    /// Weather condition.
    pub weather: Weather,
}

impl TravelFeatures {
    /// Checks range constraints on every field.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if !self.distance_km.is_finite() || self.distance_km <= 0.0 {
            return Err(PredecirError::invalid_input(
                "distance",
                "must be a positive number",
            ));
        }
        if self.day_of_week > 6 {
            return Err(PredecirError::invalid_input(
                "day_of_week",
                "must be in 0..=6",
            ));
        }
        if self.hour_of_day > 23 {
            return Err(PredecirError::invalid_input(
                "hour_of_day",
                "must be in 0..=23",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features() -> TravelFeatures {
        TravelFeatures {
            distance_km: 25.0,
            day_of_week: 2,
            hour_of_day: 8,
            is_holiday: false,
            is_rush_hour: true,
            weather: Weather::Clear,
        }
    }

    #[test]
    fn test_weather_codes_round_trip() {
        for w in Weather::ALL {
            assert_eq!(Weather::from_code(w.code()), Some(w));
        }
        assert_eq!(Weather::from_code(5), None);
    }

    #[test]
    fn test_weather_labels() {
        assert_eq!(Weather::from_label("snow"), Some(Weather::Snow));
        assert_eq!(Weather::from_label("sunny"), None);
    }

    #[test]
    fn test_speed_factors_ordered() {
        assert!(Weather::Clear.speed_factor() > Weather::Rain.speed_factor());
        assert!(Weather::Rain.speed_factor() > Weather::Storm.speed_factor());
    }

    #[test]
    fn test_validate_accepts_good_features() {
        assert!(features().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_distance() {
        for bad in [0.0, -5.0, f32::NAN, f32::INFINITY] {
            let f = TravelFeatures {
                distance_km: bad,
                ..features()
            };
            assert_eq!(f.validate().unwrap_err().kind(), "invalid_input");
        }
    }

    #[test]
    fn test_validate_rejects_bad_day_and_hour() {
        let f = TravelFeatures {
            day_of_week: 7,
            ..features()
        };
        assert!(f.validate().is_err());
        let f = TravelFeatures {
            hour_of_day: 24,
            ..features()
        };
        assert!(f.validate().is_err());
    }
}
