//! Core traits for estimators and transformers.
//!
//! These traits define the fit/predict/transform contracts shared by the
//! embedded estimators, following sklearn conventions.

use crate::error::Result;
use crate::primitives::{Matrix, Vector};

/// Primary trait for supervised learning estimators.
///
/// # Examples
///
/// ```
/// use predecir::prelude::*;
///
/// let x = Matrix::from_vec(4, 1, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
/// let y = Vector::from_slice(&[2.0, 4.0, 6.0, 8.0]);
///
/// let mut forest = RandomForestRegressor::new(5).with_random_state(42);
/// forest.fit(&x, &y).unwrap();
/// let r2 = forest.score(&x, &y);
/// assert!(r2 > 0.8);
/// ```
pub trait Estimator {
    /// Fits the model to training data.
    ///
    /// # Errors
    ///
    /// Returns an error if fitting fails (dimension mismatch, empty data, etc.).
    fn fit(&mut self, x: &Matrix, y: &Vector) -> Result<()>;

    /// Predicts target values for input data.
    ///
    /// # Errors
    ///
    /// Returns an error if the model is not fitted or dimensions mismatch.
    fn predict(&self, x: &Matrix) -> Result<Vector>;

    /// Computes the R² score on test data.
    ///
    /// Returns 0.0 when prediction fails.
    fn score(&self, x: &Matrix, y: &Vector) -> f32;
}

/// Trait for unsupervised learning models.
pub trait UnsupervisedEstimator {
    /// The type of labels produced by `predict`.
    type Labels;

    /// Fits the model to data.
    ///
    /// # Errors
    ///
    /// Returns an error if fitting fails (empty data, invalid parameters, etc.).
    fn fit(&mut self, x: &Matrix) -> Result<()>;

    /// Predicts cluster assignments for data.
    ///
    /// # Errors
    ///
    /// Returns an error if the model is not fitted or dimensions mismatch.
    fn predict(&self, x: &Matrix) -> Result<Self::Labels>;
}

/// Trait for data transformers (scalers, encoders).
pub trait Transformer {
    /// Fits the transformer to data.
    ///
    /// # Errors
    ///
    /// Returns an error if fitting fails.
    fn fit(&mut self, x: &Matrix) -> Result<()>;

    /// Transforms data using fitted parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if the transformer is not fitted.
    fn transform(&self, x: &Matrix) -> Result<Matrix>;

    /// Fits and transforms in one step.
    ///
    /// # Errors
    ///
    /// Returns an error if fitting fails.
    fn fit_transform(&mut self, x: &Matrix) -> Result<Matrix> {
        self.fit(x)?;
        self.transform(x)
    }
}
