//! Place recommender: clustering pipeline, persistence, and the request
//! context that owns a loaded model.

use super::{mock, scorer, Place, PlaceCategory, Preferences, Recommendation, UserLocation};
use crate::cluster::KMeans;
use crate::error::{PredecirError, Result};
use crate::persist::{self, TrainPolicy};
use crate::preprocessing::StandardScaler;
use crate::primitives::Matrix;
use crate::traits::{Transformer, UnsupervisedEstimator};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// Default cluster count for the place pipeline.
pub const DEFAULT_N_CLUSTERS: usize = 8;

/// Default seed for clustering.
pub const DEFAULT_SEED: u64 = 42;

const FEATURE_NAMES: [&str; 5] = [
    "latitude",
    "longitude",
    "rating",
    "price_level",
    "popularity_score",
];

/// Per-cluster aggregate statistics, reported after training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSummary {
    /// Cluster id.
    pub cluster: usize,
    /// Number of places assigned to the cluster.
    pub size: usize,
    /// Mean rating of assigned places.
    pub mean_rating: f32,
    /// Mean price level of assigned places.
    pub mean_price: f32,
    /// Mean popularity score of assigned places.
    pub mean_popularity: f32,
    /// Most frequent category, when the cluster is non-empty.
    pub modal_category: Option<PlaceCategory>,
}

/// A fitted place-recommendation model.
///
/// Carries the fitted scaler, the fitted clustering, the feature layout
/// used at training time, and the training places with their assigned
/// clusters. Saved and loaded as one bundle so the pieces can never drift
/// apart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceRecommender {
    scaler: StandardScaler,
    kmeans: KMeans,
    feature_names: Vec<String>,
    places: Vec<Place>,
}

impl PlaceRecommender {
    /// Fits the clustering pipeline on the given places.
    ///
    /// Standardizes the numeric features, runs K-Means, and attaches the
    /// resulting cluster id to each place.
    ///
    /// # Errors
    ///
    /// Returns an error if `places` is empty or has fewer entries than
    /// `n_clusters`.
    pub fn train(places: &[Place], n_clusters: usize, seed: u64) -> Result<Self> {
        if places.is_empty() {
            return Err(PredecirError::empty_input("PlaceRecommender::train"));
        }

        let features = Self::feature_matrix(places)?;
        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&features)?;

        let mut kmeans = KMeans::new(n_clusters).with_random_state(seed);
        kmeans.fit(&scaled)?;

        let labels = kmeans.labels()?.to_vec();
        let mut places = places.to_vec();
        for (place, label) in places.iter_mut().zip(labels) {
            place.cluster = Some(label);
        }

        info!(
            n_places = places.len(),
            n_clusters,
            inertia = kmeans.inertia(),
            n_iter = kmeans.n_iter(),
            "place recommender trained"
        );

        Ok(Self {
            scaler,
            kmeans,
            feature_names: FEATURE_NAMES.iter().map(|s| (*s).to_string()).collect(),
            places,
        })
    }

    /// Trains with the default cluster count and seed.
    ///
    /// # Errors
    ///
    /// Returns an error if training fails.
    pub fn train_default(places: &[Place]) -> Result<Self> {
        Self::train(places, DEFAULT_N_CLUSTERS, DEFAULT_SEED)
    }

    fn feature_matrix(places: &[Place]) -> Result<Matrix> {
        let mut data = Vec::with_capacity(places.len() * FEATURE_NAMES.len());
        for p in places {
            data.push(p.latitude as f32);
            data.push(p.longitude as f32);
            data.push(p.rating);
            data.push(f32::from(p.price_level));
            data.push(p.popularity_score);
        }
        Matrix::from_vec(places.len(), FEATURE_NAMES.len(), data)
    }

    /// The training places, each with its assigned cluster.
    #[must_use]
    pub fn places(&self) -> &[Place] {
        &self.places
    }

    /// Feature names in training column order.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Assigns the user's position to a cluster.
    ///
    /// Location is all a request carries, so the remaining features use
    /// neutral placeholders: rating 0, price level 2, popularity 0. The
    /// row passes through the fitted scaler before assignment.
    ///
    /// # Errors
    ///
    /// Returns an error if the pipeline is not fitted.
    pub fn user_cluster(&self, user: &UserLocation) -> Result<usize> {
        let row = Matrix::from_vec(
            1,
            FEATURE_NAMES.len(),
            vec![user.latitude as f32, user.longitude as f32, 0.0, 2.0, 0.0],
        )?;
        let scaled = self.scaler.transform(&row)?;
        let labels = self.kmeans.predict(&scaled)?;
        Ok(labels[0])
    }

    /// Filters, scores, and ranks the training places for a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the pipeline is not fitted.
    pub fn recommend(
        &self,
        user: &UserLocation,
        preferences: &Preferences,
        limit: usize,
    ) -> Result<Vec<Recommendation>> {
        let user_cluster = self.user_cluster(user)?;
        Ok(scorer::rank(
            &self.places,
            user,
            preferences,
            Some(user_cluster),
            limit,
        ))
    }

    /// Aggregate statistics per cluster, in cluster-id order.
    #[must_use]
    pub fn cluster_summaries(&self) -> Vec<ClusterSummary> {
        let k = self.kmeans.n_clusters();
        let mut summaries = Vec::with_capacity(k);

        for cluster in 0..k {
            let members: Vec<&Place> = self
                .places
                .iter()
                .filter(|p| p.cluster == Some(cluster))
                .collect();
            let size = members.len();

            let (mean_rating, mean_price, mean_popularity, modal_category) = if size == 0 {
                (0.0, 0.0, 0.0, None)
            } else {
                let n = size as f32;
                let mean_rating = members.iter().map(|p| p.rating).sum::<f32>() / n;
                let mean_price =
                    members.iter().map(|p| f32::from(p.price_level)).sum::<f32>() / n;
                let mean_popularity =
                    members.iter().map(|p| p.popularity_score).sum::<f32>() / n;

                let mut counts: BTreeMap<PlaceCategory, usize> = BTreeMap::new();
                for p in &members {
                    *counts.entry(p.category).or_insert(0) += 1;
                }
                // BTreeMap iteration order makes the tie-break deterministic.
                let modal = counts
                    .into_iter()
                    .max_by_key(|&(_, count)| count)
                    .map(|(cat, _)| cat);

                (mean_rating, mean_price, mean_popularity, modal)
            };

            summaries.push(ClusterSummary {
                cluster,
                size,
                mean_rating,
                mean_price,
                mean_popularity,
                modal_category,
            });
        }

        summaries
    }

    /// Saves the whole pipeline as one bundle.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        persist::save_bundle(self, path)
    }

    /// Loads a previously saved pipeline.
    ///
    /// # Errors
    ///
    /// Returns `ModelUnavailable` if the file does not exist, or a
    /// serialization error if decoding fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        persist::load_bundle(path)
    }
}

/// Owns the recommender for a service process.
///
/// The model is loaded from disk on first use and cached for the life of
/// the context. `invalidate` drops the cached model so the next request
/// reloads from disk, e.g. after retraining out of process.
#[derive(Debug)]
pub struct RecommenderContext {
    model_path: PathBuf,
    data_path: PathBuf,
    policy: TrainPolicy,
    model: Option<PlaceRecommender>,
}

impl RecommenderContext {
    /// Creates a context with the default policy (an existing artifact is
    /// required).
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(model_path: P, data_path: Q) -> Self {
        Self {
            model_path: model_path.into(),
            data_path: data_path.into(),
            policy: TrainPolicy::default(),
            model: None,
        }
    }

    /// Sets the missing-artifact policy.
    #[must_use]
    pub fn with_policy(mut self, policy: TrainPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Returns the loaded model, loading or (policy permitting) training it
    /// on first use.
    ///
    /// # Errors
    ///
    /// Returns `ModelUnavailable` when no artifact exists and the policy
    /// forbids training, or any load/train error.
    pub fn model(&mut self) -> Result<&PlaceRecommender> {
        if self.model.is_none() {
            let model = match PlaceRecommender::load(&self.model_path) {
                Ok(model) => model,
                Err(PredecirError::ModelUnavailable { path })
                    if self.policy == TrainPolicy::TrainOnMockIfMissing =>
                {
                    info!(path, "no place model artifact, training on mock data");
                    let places = mock::load_or_generate(&self.data_path)?;
                    let model = PlaceRecommender::train_default(&places)?;
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

    /// Recommends places for a user, loading the model if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be loaded or is not fitted.
    pub fn recommend(
        &mut self,
        user: &UserLocation,
        preferences: &Preferences,
        limit: usize,
    ) -> Result<Vec<Recommendation>> {
        self.model()?.recommend(user, preferences, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trained() -> PlaceRecommender {
        let places = mock::generate_places(120, 42);
        PlaceRecommender::train(&places, 5, 42).unwrap()
    }

    #[test]
    fn test_train_assigns_every_place_a_cluster() {
        let model = trained();
        for place in model.places() {
            let cluster = place.cluster.expect("cluster assigned during training");
            assert!(cluster < 5);
        }
    }

    #[test]
    fn test_train_is_deterministic() {
        let places = mock::generate_places(120, 42);
        let a = PlaceRecommender::train(&places, 5, 42).unwrap();
        let b = PlaceRecommender::train(&places, 5, 42).unwrap();
        let clusters_a: Vec<_> = a.places().iter().map(|p| p.cluster).collect();
        let clusters_b: Vec<_> = b.places().iter().map(|p| p.cluster).collect();
        assert_eq!(clusters_a, clusters_b);
    }

    #[test]
    fn test_train_on_empty_fails() {
        assert!(PlaceRecommender::train(&[], 5, 42).is_err());
    }

    #[test]
    fn test_user_cluster_in_range() {
        let model = trained();
        let user = UserLocation {
            latitude: 34.1,
            longitude: -118.3,
        };
        assert!(model.user_cluster(&user).unwrap() < 5);
    }

    #[test]
    fn test_recommend_respects_preferences_and_limit() {
        let model = trained();
        let user = UserLocation {
            latitude: 34.1,
            longitude: -118.3,
        };
        let prefs = Preferences {
            max_price: Some(3),
            min_rating: Some(4.0),
            place_type: Some(PlaceCategory::Restaurant),
        };
        let recs = model.recommend(&user, &prefs, 5).unwrap();
        assert!(recs.len() <= 5);
        for rec in &recs {
            assert_eq!(rec.place.category, PlaceCategory::Restaurant);
            assert!(rec.place.price_level <= 3);
            assert!(rec.place.rating >= 4.0);
        }
    }

    #[test]
    fn test_cluster_summaries_cover_all_places() {
        let model = trained();
        let summaries = model.cluster_summaries();
        assert_eq!(summaries.len(), 5);
        let total: usize = summaries.iter().map(|s| s.size).sum();
        assert_eq!(total, model.places().len());
        for summary in summaries.iter().filter(|s| s.size > 0) {
            assert!(summary.mean_rating >= 1.0 && summary.mean_rating < 5.0);
            assert!(summary.modal_category.is_some());
        }
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("places.bin");
        let model = trained();
        model.save(&path).unwrap();

        let loaded = PlaceRecommender::load(&path).unwrap();
        let user = UserLocation {
            latitude: 34.1,
            longitude: -118.3,
        };
        let a = model.recommend(&user, &Preferences::default(), 5).unwrap();
        let b = loaded.recommend(&user, &Preferences::default(), 5).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_context_default_policy_requires_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = RecommenderContext::new(
            dir.path().join("places.bin"),
            dir.path().join("places.csv"),
        );
        let user = UserLocation {
            latitude: 34.1,
            longitude: -118.3,
        };
        let err = ctx.recommend(&user, &Preferences::default(), 5).unwrap_err();
        assert_eq!(err.kind(), "model_unavailable");
    }

    #[test]
    fn test_context_trains_on_mock_when_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("places.bin");
        let mut ctx = RecommenderContext::new(&model_path, dir.path().join("places.csv"))
            .with_policy(TrainPolicy::TrainOnMockIfMissing);
        let user = UserLocation {
            latitude: 34.1,
            longitude: -118.3,
        };
        let recs = ctx.recommend(&user, &Preferences::default(), 5).unwrap();
        assert_eq!(recs.len(), 5);
        assert!(model_path.exists());
    }

    #[test]
    fn test_invalidate_reloads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("places.bin");
        trained().save(&model_path).unwrap();

        let mut ctx = RecommenderContext::new(&model_path, dir.path().join("places.csv"));
        ctx.model().unwrap();
        ctx.invalidate();
        // Still loadable; the artifact on disk is untouched.
        assert!(ctx.model().is_ok());
    }
}
