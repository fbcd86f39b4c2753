//! Evaluation metrics.
//!
//! Regression R² and clustering inertia, the two quantities the trainers
//! report.

use crate::primitives::{Matrix, Vector};

/// Computes the coefficient of determination (R²).
///
/// R² = 1 - (`SS_res` / `SS_tot`), with 0.0 returned for a constant target.
///
/// # Examples
///
/// ```
/// use predecir::metrics::r_squared;
/// use predecir::primitives::Vector;
///
/// let y_true = Vector::from_slice(&[3.0, -0.5, 2.0, 7.0]);
/// let y_pred = Vector::from_slice(&[2.5, 0.0, 2.0, 8.0]);
/// assert!(r_squared(&y_pred, &y_true) > 0.9);
/// ```
///
/// # Panics
///
/// Panics if vectors have different lengths.
#[must_use]
pub fn r_squared(y_pred: &Vector, y_true: &Vector) -> f32 {
    assert_eq!(y_pred.len(), y_true.len(), "Vectors must have same length");

    let y_mean = y_true.mean();

    let ss_res: f32 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();

    let ss_tot: f32 = y_true.iter().map(|t| (t - y_mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return 0.0;
    }

    1.0 - (ss_res / ss_tot)
}

/// Within-cluster sum of squared distances to assigned centroids.
///
/// # Panics
///
/// Panics if `labels` length differs from the number of samples or a label
/// exceeds the centroid count.
#[must_use]
pub fn inertia(x: &Matrix, centroids: &Matrix, labels: &[usize]) -> f32 {
    assert_eq!(x.n_rows(), labels.len(), "one label per sample");

    let mut total = 0.0;
    for (i, &label) in labels.iter().enumerate() {
        let point = x.row(i);
        let centroid = centroids.row(label);
        total += point
            .iter()
            .zip(centroid.iter())
            .map(|(p, c)| (p - c).powi(2))
            .sum::<f32>();
    }
    total
}
