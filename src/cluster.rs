//! K-Means clustering.
//!
//! Lloyd's algorithm with a deterministic farthest-point variant of
//! k-means++ initialization, so a fixed seed always reproduces the same
//! partition.

use crate::error::{PredecirError, Result};
use crate::metrics::inertia;
use crate::primitives::Matrix;
use crate::traits::UnsupervisedEstimator;
use serde::{Deserialize, Serialize};

/// K-Means clustering algorithm.
///
/// # Algorithm
///
/// 1. Initialize centroids (seeded first pick, then farthest-point)
/// 2. Assign each sample to the nearest centroid
/// 3. Update centroids as the mean of assigned samples
/// 4. Repeat until centroid movement falls below tolerance or max iterations
///
/// # Examples
///
/// ```
/// use predecir::cluster::KMeans;
/// use predecir::primitives::Matrix;
/// use predecir::traits::UnsupervisedEstimator;
///
/// let data = Matrix::from_vec(6, 2, vec![
///     1.0, 2.0,
///     1.5, 1.8,
///     5.0, 8.0,
///     8.0, 8.0,
///     1.0, 0.6,
///     9.0, 11.0,
/// ]).unwrap();
///
/// let mut kmeans = KMeans::new(2).with_random_state(42);
/// kmeans.fit(&data).unwrap();
/// let labels = kmeans.predict(&data).unwrap();
/// assert_eq!(labels.len(), 6);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KMeans {
    /// Number of clusters.
    n_clusters: usize,
    /// Maximum iterations.
    max_iter: usize,
    /// Convergence tolerance on centroid movement.
    tol: f32,
    /// Random seed for initialization.
    random_state: Option<u64>,
    /// Cluster centroids after fitting.
    centroids: Option<Matrix>,
    /// Labels for training data.
    labels: Option<Vec<usize>>,
    /// Within-cluster sum of squared distances.
    inertia: f32,
    /// Number of iterations run.
    n_iter: usize,
}

impl Default for KMeans {
    fn default() -> Self {
        Self::new(8)
    }
}

impl KMeans {
    /// Creates a new K-Means with the specified number of clusters.
    #[must_use]
    pub fn new(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            max_iter: 300,
            tol: 1e-4,
            random_state: None,
            centroids: None,
            labels: None,
            inertia: 0.0,
            n_iter: 0,
        }
    }

    /// Sets the maximum number of iterations.
    #[must_use]
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Sets the convergence tolerance.
    #[must_use]
    pub fn with_tol(mut self, tol: f32) -> Self {
        self.tol = tol;
        self
    }

    /// Sets the random seed for reproducibility.
    #[must_use]
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Returns the number of clusters.
    #[must_use]
    pub fn n_clusters(&self) -> usize {
        self.n_clusters
    }

    /// Returns the cluster centroids.
    ///
    /// # Errors
    ///
    /// Returns an error if the model is not fitted.
    pub fn centroids(&self) -> Result<&Matrix> {
        self.centroids
            .as_ref()
            .ok_or_else(|| PredecirError::not_fitted("KMeans"))
    }

    /// Returns the training labels.
    ///
    /// # Errors
    ///
    /// Returns an error if the model is not fitted.
    pub fn labels(&self) -> Result<&[usize]> {
        self.labels
            .as_deref()
            .ok_or_else(|| PredecirError::not_fitted("KMeans"))
    }

    /// Returns the inertia (within-cluster sum of squares).
    #[must_use]
    pub fn inertia(&self) -> f32 {
        self.inertia
    }

    /// Returns the number of iterations run.
    #[must_use]
    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    /// Returns true if the model has been fitted.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.centroids.is_some()
    }

    /// Initializes centroids: seeded first pick, then farthest-point.
    fn init_centroids(&self, x: &Matrix) -> Matrix {
        let (n_samples, n_features) = x.shape();
        let mut centroids_data = Vec::with_capacity(self.n_clusters * n_features);

        let seed = self.random_state.unwrap_or(42);
        let first_idx = (seed as usize) % n_samples;
        centroids_data.extend_from_slice(x.row(first_idx));

        for _ in 1..self.n_clusters {
            let n_current = centroids_data.len() / n_features;
            let mut best_idx = 0;
            let mut best_dist = -1.0f32;

            for i in 0..n_samples {
                let point = x.row(i);
                let mut min_dist = f32::INFINITY;
                for c in 0..n_current {
                    let centroid = &centroids_data[c * n_features..(c + 1) * n_features];
                    let dist: f32 = point
                        .iter()
                        .zip(centroid.iter())
                        .map(|(p, q)| (p - q).powi(2))
                        .sum();
                    if dist < min_dist {
                        min_dist = dist;
                    }
                }
                if min_dist > best_dist {
                    best_dist = min_dist;
                    best_idx = i;
                }
            }

            centroids_data.extend_from_slice(x.row(best_idx));
        }

        Matrix::from_vec(self.n_clusters, n_features, centroids_data)
            .expect("centroid matrix dimensions are consistent by construction")
    }

    /// Assigns each sample to its nearest centroid.
    fn assign_labels(x: &Matrix, centroids: &Matrix) -> Vec<usize> {
        let n_samples = x.n_rows();
        let k = centroids.n_rows();
        let mut labels = vec![0usize; n_samples];

        for (i, label) in labels.iter_mut().enumerate() {
            let point = x.row(i);
            let mut min_dist = f32::INFINITY;

            for c in 0..k {
                let centroid = centroids.row(c);
                let dist: f32 = point
                    .iter()
                    .zip(centroid.iter())
                    .map(|(p, q)| (p - q).powi(2))
                    .sum();
                if dist < min_dist {
                    min_dist = dist;
                    *label = c;
                }
            }
        }

        labels
    }

    /// Updates centroids as the mean of assigned samples. Empty clusters
    /// keep their previous centroid.
    fn update_centroids(&self, x: &Matrix, labels: &[usize], old: &Matrix) -> Matrix {
        let (_, n_features) = x.shape();
        let mut sums = vec![0.0f32; self.n_clusters * n_features];
        let mut counts = vec![0usize; self.n_clusters];

        for (i, &label) in labels.iter().enumerate() {
            counts[label] += 1;
            for (j, v) in x.row(i).iter().enumerate() {
                sums[label * n_features + j] += v;
            }
        }

        for c in 0..self.n_clusters {
            if counts[c] > 0 {
                for j in 0..n_features {
                    sums[c * n_features + j] /= counts[c] as f32;
                }
            } else {
                for j in 0..n_features {
                    sums[c * n_features + j] = old.get(c, j);
                }
            }
        }

        Matrix::from_vec(self.n_clusters, n_features, sums)
            .expect("centroid matrix dimensions are consistent by construction")
    }

    /// Checks whether every centroid moved less than `tol`.
    fn converged(&self, old: &Matrix, new: &Matrix) -> bool {
        let (k, n_features) = old.shape();
        for c in 0..k {
            let mut dist_sq = 0.0f32;
            for j in 0..n_features {
                let diff = old.get(c, j) - new.get(c, j);
                dist_sq += diff * diff;
            }
            if dist_sq > self.tol * self.tol {
                return false;
            }
        }
        true
    }
}

impl UnsupervisedEstimator for KMeans {
    type Labels = Vec<usize>;

    fn fit(&mut self, x: &Matrix) -> Result<()> {
        let n_samples = x.n_rows();

        if n_samples == 0 {
            return Err(PredecirError::empty_input("KMeans::fit"));
        }
        if self.n_clusters == 0 {
            return Err(PredecirError::InvalidHyperparameter {
                param: "n_clusters".to_string(),
                value: "0".to_string(),
                constraint: ">= 1".to_string(),
            });
        }
        if n_samples < self.n_clusters {
            return Err(PredecirError::dimension_mismatch(
                "samples >= clusters",
                self.n_clusters,
                n_samples,
            ));
        }

        let mut centroids = self.init_centroids(x);
        let mut labels = vec![0usize; n_samples];
        self.n_iter = self.max_iter;

        for iter in 0..self.max_iter {
            labels = Self::assign_labels(x, &centroids);
            let new_centroids = self.update_centroids(x, &labels, &centroids);

            let done = self.converged(&centroids, &new_centroids);
            centroids = new_centroids;

            if done {
                self.n_iter = iter + 1;
                break;
            }
        }

        self.inertia = inertia(x, &centroids, &labels);
        self.centroids = Some(centroids);
        self.labels = Some(labels);
        Ok(())
    }

    fn predict(&self, x: &Matrix) -> Result<Vec<usize>> {
        let centroids = self.centroids()?;
        if x.n_cols() != centroids.n_cols() {
            return Err(PredecirError::dimension_mismatch(
                "features",
                centroids.n_cols(),
                x.n_cols(),
            ));
        }
        Ok(Self::assign_labels(x, centroids))
    }
}
