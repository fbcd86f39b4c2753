//! Versioned feature schema for the travel-time model.
//!
//! The schema pins the exact column layout a model was trained with. It is
//! persisted inside the model bundle and checked on load, so a model built
//! against an older layout is rejected with a schema mismatch instead of
//! silently consuming misaligned columns. Day-of-week is one-hot expanded
//! deterministically from the schema itself; no fitted encoder state is
//! required.

use super::TravelFeatures;
use crate::error::{PredecirError, Result};
use crate::primitives::Matrix;
use serde::{Deserialize, Serialize};

/// Current schema version. Bump when the column layout changes.
pub const SCHEMA_VERSION: u32 = 1;

/// Column layout of the travel feature matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    /// Layout version.
    pub version: u32,
    /// Column names, in matrix order.
    pub columns: Vec<String>,
}

impl FeatureSchema {
    /// The schema this library version expands inputs into.
    #[must_use]
    pub fn current() -> Self {
        let mut columns = vec![
            "distance_km".to_string(),
            "hour_of_day".to_string(),
            "is_holiday".to_string(),
            "is_rush_hour".to_string(),
            "weather_code".to_string(),
        ];
        for day in 0..7 {
            columns.push(format!("day_{day}"));
        }
        Self {
            version: SCHEMA_VERSION,
            columns,
        }
    }

    /// Number of columns.
    #[must_use]
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// Checks that a persisted schema matches the current layout.
    ///
    /// # Errors
    ///
    /// Returns `SchemaMismatch` describing both layouts.
    pub fn validate(&self) -> Result<()> {
        let current = Self::current();
        if *self != current {
            return Err(PredecirError::SchemaMismatch {
                expected: format!("v{} ({} columns)", current.version, current.n_columns()),
                actual: format!("v{} ({} columns)", self.version, self.n_columns()),
            });
        }
        Ok(())
    }

    /// Expands one validated input into a feature row.
    ///
    /// Numeric fields are copied, flags become 0/1, weather becomes its
    /// code, and day-of-week becomes a one-hot group with exactly one
    /// column set.
    #[must_use]
    pub fn expand(&self, features: &TravelFeatures) -> Vec<f32> {
        let mut row = Vec::with_capacity(self.n_columns());
        row.push(features.distance_km);
        row.push(f32::from(features.hour_of_day));
        row.push(f32::from(u8::from(features.is_holiday)));
        row.push(f32::from(u8::from(features.is_rush_hour)));
        row.push(f32::from(features.weather.code()));
        for day in 0..7 {
            row.push(if features.day_of_week == day { 1.0 } else { 0.0 });
        }
        row
    }

    /// Expands a batch of inputs into a feature matrix.
    ///
    /// # Errors
    ///
    /// Returns an error if `inputs` is empty.
    pub fn expand_matrix(&self, inputs: &[TravelFeatures]) -> Result<Matrix> {
        if inputs.is_empty() {
            return Err(PredecirError::empty_input("FeatureSchema::expand_matrix"));
        }
        let mut data = Vec::with_capacity(inputs.len() * self.n_columns());
        for f in inputs {
            data.extend(self.expand(f));
        }
        Matrix::from_vec(inputs.len(), self.n_columns(), data)
    }
}
