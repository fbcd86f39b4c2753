//! # predecir
//!
//! Place recommendation and travel-time prediction in pure Rust.
//!
//! Two pipelines share a small embedded ML core:
//!
//! - **Places**: points of interest are clustered with K-Means on
//!   standardized features; requests are filtered by preference predicates
//!   and ranked by a fixed blend of proximity, rating, and cluster
//!   affinity.
//! - **Travel time**: a random forest regressor over trip features
//!   (distance, hour, calendar flags, weather), expanded through a
//!   versioned feature schema that is persisted with the model and
//!   re-validated on load.
//!
//! Each pipeline persists as a single bincode bundle (fitted scaler,
//! fitted model, feature layout) and is owned at serving time by a
//! context that loads the bundle once and caches it. The [`service`]
//! module adapts both contexts to JSON requests and responses.
//!
//! ## Quick start
//!
//! ```
//! use predecir::places::{mock, PlaceRecommender, Preferences, UserLocation};
//!
//! let places = mock::generate_places(100, 42);
//! let model = PlaceRecommender::train(&places, 4, 42)?;
//!
//! let user = UserLocation { latitude: 34.1, longitude: -118.3 };
//! let recs = model.recommend(&user, &Preferences::default(), 5)?;
//! assert_eq!(recs.len(), 5);
//! # Ok::<(), predecir::error::PredecirError>(())
//! ```

#![warn(missing_docs)]

pub mod cluster;
pub mod error;
pub mod metrics;
pub mod model_selection;
pub mod persist;
pub mod places;
pub mod preprocessing;
pub mod primitives;
pub mod service;
pub mod traits;
pub mod travel;
pub mod tree;

/// Common imports for working with the estimators and pipelines.
pub mod prelude {
    pub use crate::cluster::KMeans;
    pub use crate::error::{PredecirError, Result};
    pub use crate::persist::TrainPolicy;
    pub use crate::places::{
        Place, PlaceCategory, PlaceRecommender, Preferences, Recommendation, RecommenderContext,
        UserLocation,
    };
    pub use crate::preprocessing::StandardScaler;
    pub use crate::primitives::{Matrix, Vector};
    pub use crate::traits::{Estimator, Transformer, UnsupervisedEstimator};
    pub use crate::travel::{
        FeatureSchema, PredictorContext, TrainConfig, TravelFeatures, TravelTimeModel, Weather,
    };
    pub use crate::tree::{DecisionTreeRegressor, RandomForestRegressor};
}
