//! Preprocessing transformers.
//!
//! `StandardScaler` standardizes each feature to zero mean and unit variance.
//! Parameters are fit once on training data and reused verbatim for every
//! later transform, so train-time and inference-time inputs always pass
//! through the same affine map.

use crate::error::{PredecirError, Result};
use crate::primitives::Matrix;
use crate::traits::Transformer;
use serde::{Deserialize, Serialize};

/// Standardizes features by removing the mean and scaling to unit variance.
///
/// The standard score of a sample x is `z = (x - mean) / std`. Constant
/// columns get a std of 1.0 so they pass through centered instead of
/// dividing by zero.
///
/// # Examples
///
/// ```
/// use predecir::preprocessing::StandardScaler;
/// use predecir::primitives::Matrix;
/// use predecir::traits::Transformer;
///
/// let data = Matrix::from_vec(3, 2, vec![
///     0.0, 0.0,
///     1.0, 10.0,
///     2.0, 20.0,
/// ]).unwrap();
///
/// let mut scaler = StandardScaler::new();
/// let scaled = scaler.fit_transform(&data).unwrap();
///
/// let (n_rows, n_cols) = scaled.shape();
/// for j in 0..n_cols {
///     let mean: f32 = (0..n_rows).map(|i| scaled.get(i, j)).sum::<f32>() / n_rows as f32;
///     assert!(mean.abs() < 1e-5);
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    /// Per-feature mean, computed during fit.
    mean: Option<Vec<f32>>,
    /// Per-feature standard deviation, computed during fit.
    std: Option<Vec<f32>>,
}

impl Default for StandardScaler {
    fn default() -> Self {
        Self::new()
    }
}

impl StandardScaler {
    /// Creates an unfitted scaler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            mean: None,
            std: None,
        }
    }

    /// Returns true if the scaler has been fitted.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.mean.is_some()
    }

    /// Returns the fitted per-feature means.
    ///
    /// # Errors
    ///
    /// Returns an error if the scaler is not fitted.
    pub fn mean(&self) -> Result<&[f32]> {
        self.mean
            .as_deref()
            .ok_or_else(|| PredecirError::not_fitted("StandardScaler"))
    }

    /// Returns the fitted per-feature standard deviations.
    ///
    /// # Errors
    ///
    /// Returns an error if the scaler is not fitted.
    pub fn std(&self) -> Result<&[f32]> {
        self.std
            .as_deref()
            .ok_or_else(|| PredecirError::not_fitted("StandardScaler"))
    }
}

impl Transformer for StandardScaler {
    fn fit(&mut self, x: &Matrix) -> Result<()> {
        let (n_rows, n_cols) = x.shape();
        if n_rows == 0 {
            return Err(PredecirError::empty_input("StandardScaler::fit"));
        }

        let mut mean = vec![0.0f32; n_cols];
        for i in 0..n_rows {
            for (j, m) in mean.iter_mut().enumerate() {
                *m += x.get(i, j);
            }
        }
        for m in &mut mean {
            *m /= n_rows as f32;
        }

        let mut std = vec![0.0f32; n_cols];
        for i in 0..n_rows {
            for (j, s) in std.iter_mut().enumerate() {
                let diff = x.get(i, j) - mean[j];
                *s += diff * diff;
            }
        }
        for s in &mut std {
            *s = (*s / n_rows as f32).sqrt();
            // Constant column: pass through centered rather than divide by zero.
            if *s == 0.0 {
                *s = 1.0;
            }
        }

        self.mean = Some(mean);
        self.std = Some(std);
        Ok(())
    }

    fn transform(&self, x: &Matrix) -> Result<Matrix> {
        let mean = self
            .mean
            .as_ref()
            .ok_or_else(|| PredecirError::not_fitted("StandardScaler"))?;
        let std = self
            .std
            .as_ref()
            .ok_or_else(|| PredecirError::not_fitted("StandardScaler"))?;

        let (n_rows, n_cols) = x.shape();
        if n_cols != mean.len() {
            return Err(PredecirError::dimension_mismatch(
                "features",
                mean.len(),
                n_cols,
            ));
        }

        let mut out = Matrix::zeros(n_rows, n_cols);
        for i in 0..n_rows {
            for j in 0..n_cols {
                out.set(i, j, (x.get(i, j) - mean[j]) / std[j]);
            }
        }
        Ok(out)
    }
}
