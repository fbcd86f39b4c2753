//! Travel-time model: training, persistence, and the request context.

use super::mock::{self, TravelRecord};
use super::schema::FeatureSchema;
use super::TravelFeatures;
use crate::error::{PredecirError, Result};
use crate::model_selection::train_test_split;
use crate::persist::{self, TrainPolicy};
use crate::preprocessing::StandardScaler;
use crate::primitives::{Matrix, Vector};
use crate::traits::{Estimator, Transformer};
use crate::tree::RandomForestRegressor;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Fixed confidence reported with every prediction. The forest has no
/// calibrated uncertainty estimate; this mirrors the single advertised
/// figure the serving layer exposes.
pub const PREDICTION_CONFIDENCE: f64 = 0.85;

/// Training hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Number of trees in the forest.
    pub n_estimators: usize,
    /// Maximum depth per tree.
    pub max_depth: Option<usize>,
    /// Seed for the split and the bootstrap samples.
    pub seed: u64,
    /// Fraction held out for validation.
    pub test_size: f32,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: Some(12),
            seed: 42,
            test_size: 0.2,
        }
    }
}

/// Fit quality reported after training.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainReport {
    /// R² on the training split.
    pub r2_train: f32,
    /// R² on the held-out split.
    pub r2_validation: f32,
    /// Training split size.
    pub n_train: usize,
    /// Validation split size.
    pub n_validation: usize,
}

/// A fitted travel-time model.
///
/// The bundle carries the fitted scaler, the forest, and the feature
/// schema the matrix was built against; the schema is re-validated on
/// load so a stale artifact fails loudly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TravelTimeModel {
    scaler: StandardScaler,
    forest: RandomForestRegressor,
    schema: FeatureSchema,
}

impl TravelTimeModel {
    /// Trains a forest on labelled trips and reports held-out fit quality.
    ///
    /// # Errors
    ///
    /// Returns an error if `records` is empty, a record carries an unknown
    /// weather code, or the split would leave an empty set.
    pub fn train(records: &[TravelRecord], config: &TrainConfig) -> Result<(Self, TrainReport)> {
        if records.is_empty() {
            return Err(PredecirError::empty_input("TravelTimeModel::train"));
        }

        let schema = FeatureSchema::current();
        let features = records
            .iter()
            .map(TravelRecord::features)
            .collect::<Result<Vec<TravelFeatures>>>()?;
        let x = schema.expand_matrix(&features)?;
        let y = Vector::from_vec(records.iter().map(|r| r.travel_time_minutes).collect());

        let (x_train, x_val, y_train, y_val) =
            train_test_split(&x, &y, config.test_size, Some(config.seed))?;

        let mut scaler = StandardScaler::new();
        let x_train_scaled = scaler.fit_transform(&x_train)?;
        let x_val_scaled = scaler.transform(&x_val)?;

        let mut forest =
            RandomForestRegressor::new(config.n_estimators).with_random_state(config.seed);
        if let Some(depth) = config.max_depth {
            forest = forest.with_max_depth(depth);
        }
        forest.fit(&x_train_scaled, &y_train)?;

        let report = TrainReport {
            r2_train: forest.score(&x_train_scaled, &y_train),
            r2_validation: forest.score(&x_val_scaled, &y_val),
            n_train: y_train.len(),
            n_validation: y_val.len(),
        };

        info!(
            n_train = report.n_train,
            n_validation = report.n_validation,
            r2_train = report.r2_train,
            r2_validation = report.r2_validation,
            "travel time model trained"
        );

        Ok((
            Self {
                scaler,
                forest,
                schema,
            },
            report,
        ))
    }

    /// Trains with default hyperparameters on the default mock dataset size.
    ///
    /// # Errors
    ///
    /// Returns an error if training fails.
    pub fn train_default(records: &[TravelRecord]) -> Result<(Self, TrainReport)> {
        Self::train(records, &TrainConfig::default())
    }

    /// The schema this model's feature matrix was built against.
    #[must_use]
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Predicts travel time in minutes for one trip.
    ///
    /// The input is validated, expanded through the schema, and scaled
    /// with the training-time parameters. Predictions are floored at one
    /// minute.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for out-of-range fields or an error if the
    /// model is not fitted.
    pub fn predict(&self, features: &TravelFeatures) -> Result<f32> {
        features.validate()?;
        let row = Matrix::from_vec(1, self.schema.n_columns(), self.schema.expand(features))?;
        let scaled = self.scaler.transform(&row)?;
        let minutes = self.forest.predict_one(scaled.row(0))?;
        Ok(minutes.max(1.0))
    }

    /// Saves the whole pipeline as one bundle.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        persist::save_bundle(self, path)
    }

    /// Loads a previously saved pipeline and validates its schema.
    ///
    /// # Errors
    ///
    /// Returns `ModelUnavailable` if the file does not exist,
    /// `SchemaMismatch` if the artifact was trained against a different
    /// column layout, or a serialization error if decoding fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let model: Self = persist::load_bundle(path)?;
        model.schema.validate()?;
        Ok(model)
    }
}

/// Owns the travel-time model for a service process.
///
/// Mirrors the recommender context: load on first use, cache for the life
/// of the context, `invalidate` to force a reload.
#[derive(Debug)]
pub struct PredictorContext {
    model_path: PathBuf,
    data_path: PathBuf,
    policy: TrainPolicy,
    config: TrainConfig,
    model: Option<TravelTimeModel>,
}

impl PredictorContext {
    /// Creates a context with the default policy (an existing artifact is
    /// required).
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(model_path: P, data_path: Q) -> Self {
        Self {
            model_path: model_path.into(),
            data_path: data_path.into(),
            policy: TrainPolicy::default(),
            config: TrainConfig::default(),
            model: None,
        }
    }

    /// Sets the missing-artifact policy.
    #[must_use]
    pub fn with_policy(mut self, policy: TrainPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the hyperparameters used when the policy trains on mock data.
    #[must_use]
    pub fn with_config(mut self, config: TrainConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the loaded model, loading or (policy permitting) training it
    /// on first use.
    ///
    /// # Errors
    ///
    /// Returns `ModelUnavailable` when no artifact exists and the policy
    /// forbids training, or any load/train error.
    pub fn model(&mut self) -> Result<&TravelTimeModel> {
        if self.model.is_none() {
            let model = match TravelTimeModel::load(&self.model_path) {
                Ok(model) => model,
                Err(PredecirError::ModelUnavailable { path })
                    if self.policy == TrainPolicy::TrainOnMockIfMissing =>
                {
                    info!(path, "no travel model artifact, training on mock data");
                    let records = mock::load_or_generate(&self.data_path)?;
                    let (model, _) = TravelTimeModel::train(&records, &self.config)?;
                    model.save(&self.model_path)?;
                    model
                }
                Err(e) => return Err(e),
            };
            self.model = Some(model);
        }
        Ok(self.model.as_ref().expect("model cached above"))
    }

    /// Drops the cached model so the next request reloads from disk.
    pub fn invalidate(&mut self) {
        self.model = None;
    }

    /// Predicts travel time for one trip, loading the model if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be loaded or the input is
    /// invalid.
    pub fn predict(&mut self, features: &TravelFeatures) -> Result<f32> {
        self.model()?.predict(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::travel::Weather;

    fn small_config() -> TrainConfig {
        TrainConfig {
            n_estimators: 25,
            max_depth: Some(10),
            seed: 42,
            test_size: 0.2,
        }
    }

    fn trained() -> (TravelTimeModel, TrainReport) {
        let records = mock::generate_travel_data(400, 42);
        TravelTimeModel::train(&records, &small_config()).unwrap()
    }

    fn trip(distance_km: f32, rush: bool) -> TravelFeatures {
        TravelFeatures {
            distance_km,
            day_of_week: 2,
            hour_of_day: 8,
            is_holiday: false,
            is_rush_hour: rush,
            weather: Weather::Clear,
        }
    }

    #[test]
    fn test_train_reports_reasonable_fit() {
        let (_, report) = trained();
        assert_eq!(report.n_train + report.n_validation, 400);
        assert!(report.r2_train > 0.9, "r2_train = {}", report.r2_train);
        assert!(
            report.r2_validation > 0.5,
            "r2_validation = {}",
            report.r2_validation
        );
    }

    #[test]
    fn test_train_on_empty_fails() {
        assert!(TravelTimeModel::train(&[], &small_config()).is_err());
    }

    #[test]
    fn test_predict_tracks_distance() {
        let (model, _) = trained();
        let short = model.predict(&trip(10.0, false)).unwrap();
        let long = model.predict(&trip(90.0, false)).unwrap();
        assert!(long > short, "short = {short}, long = {long}");
        // 90 km at free flow is 90 minutes; the estimate should be near it.
        assert!((60.0..130.0).contains(&long), "long = {long}");
    }

    #[test]
    fn test_rush_hour_slows_prediction() {
        let (model, _) = trained();
        let free = model.predict(&trip(50.0, false)).unwrap();
        let rush = model.predict(&trip(50.0, true)).unwrap();
        assert!(rush > free, "free = {free}, rush = {rush}");
    }

    #[test]
    fn test_predict_floors_at_one_minute() {
        let (model, _) = trained();
        let minutes = model.predict(&trip(1.0, false)).unwrap();
        assert!(minutes >= 1.0);
    }

    #[test]
    fn test_predict_rejects_invalid_input() {
        let (model, _) = trained();
        let bad = TravelFeatures {
            distance_km: -1.0,
            ..trip(10.0, false)
        };
        assert_eq!(model.predict(&bad).unwrap_err().kind(), "invalid_input");
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("travel.bin");
        let (model, _) = trained();
        model.save(&path).unwrap();

        let loaded = TravelTimeModel::load(&path).unwrap();
        let features = trip(42.0, true);
        assert_eq!(
            model.predict(&features).unwrap(),
            loaded.predict(&features).unwrap()
        );
    }

    #[test]
    fn test_load_rejects_stale_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("travel.bin");
        let (mut model, _) = trained();
        model.schema.version = 0;
        persist::save_bundle(&model, &path).unwrap();

        let err = TravelTimeModel::load(&path).unwrap_err();
        assert_eq!(err.kind(), "schema_mismatch");
    }

    #[test]
    fn test_context_default_policy_requires_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = PredictorContext::new(
            dir.path().join("travel.bin"),
            dir.path().join("travel.csv"),
        );
        let err = ctx.predict(&trip(10.0, false)).unwrap_err();
        assert_eq!(err.kind(), "model_unavailable");
    }

    #[test]
    fn test_context_trains_on_mock_when_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("travel.bin");
        let mut ctx = PredictorContext::new(&model_path, dir.path().join("travel.csv"))
            .with_policy(TrainPolicy::TrainOnMockIfMissing)
            .with_config(small_config());
        let minutes = ctx.predict(&trip(30.0, false)).unwrap();
        assert!(minutes >= 1.0);
        assert!(model_path.exists());
    }
}
