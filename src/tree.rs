//! Regression trees and random forest ensembles.
//!
//! CART-style trees split on the feature/threshold pair that minimizes the
//! summed squared error of the two children; leaves predict the mean target.
//! The forest trains each tree on a seeded bootstrap sample and averages
//! predictions.

use crate::error::{PredecirError, Result};
use crate::metrics::r_squared;
use crate::primitives::{Matrix, Vector};
use crate::traits::Estimator;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Leaf node in a regression tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionLeaf {
    /// Predicted value (mean of training targets in this leaf).
    pub value: f32,
    /// Number of training samples that reached this leaf.
    pub n_samples: usize,
}

/// Internal node in a regression tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionNode {
    /// Index of the feature to split on.
    pub feature_idx: usize,
    /// Threshold value; samples with `feature <= threshold` go left.
    pub threshold: f32,
    /// Left subtree.
    pub left: Box<RegressionTreeNode>,
    /// Right subtree.
    pub right: Box<RegressionTreeNode>,
}

/// A node in a regression tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RegressionTreeNode {
    /// Internal decision node.
    Node(RegressionNode),
    /// Leaf with a value prediction.
    Leaf(RegressionLeaf),
}

impl RegressionTreeNode {
    /// Depth of the tree rooted at this node (leaves have depth 0).
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            RegressionTreeNode::Leaf(_) => 0,
            RegressionTreeNode::Node(node) => 1 + node.left.depth().max(node.right.depth()),
        }
    }
}

/// Best split found for a node: (feature, threshold, children SSE).
struct Split {
    feature_idx: usize,
    threshold: f32,
    cost: f32,
}

/// Sum of squared errors around the mean for targets selected by `indices`.
fn sse(y: &[f32], indices: &[usize]) -> f32 {
    if indices.is_empty() {
        return 0.0;
    }
    let sum: f32 = indices.iter().map(|&i| y[i]).sum();
    let mean = sum / indices.len() as f32;
    indices.iter().map(|&i| (y[i] - mean).powi(2)).sum()
}

/// Finds the SSE-minimizing split across all features using one sorted
/// sweep per feature with running sums.
fn find_best_split(
    x: &Matrix,
    y: &[f32],
    indices: &[usize],
    min_samples_leaf: usize,
) -> Option<Split> {
    let n = indices.len();
    if n < 2 {
        return None;
    }

    let n_features = x.n_cols();
    let mut best: Option<Split> = None;

    for feature_idx in 0..n_features {
        let mut pairs: Vec<(f32, f32)> = indices
            .iter()
            .map(|&i| (x.get(i, feature_idx), y[i]))
            .collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        let total_sum: f32 = pairs.iter().map(|p| p.1).sum();
        let total_sq: f32 = pairs.iter().map(|p| p.1 * p.1).sum();

        let mut left_sum = 0.0f32;
        let mut left_sq = 0.0f32;

        for i in 1..n {
            left_sum += pairs[i - 1].1;
            left_sq += pairs[i - 1].1 * pairs[i - 1].1;

            // No threshold exists between equal feature values.
            if pairs[i - 1].0 == pairs[i].0 {
                continue;
            }
            if i < min_samples_leaf || n - i < min_samples_leaf {
                continue;
            }

            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;
            let n_left = i as f32;
            let n_right = (n - i) as f32;

            let cost = (left_sq - left_sum * left_sum / n_left)
                + (right_sq - right_sum * right_sum / n_right);

            if best.as_ref().map_or(true, |b| cost < b.cost) {
                best = Some(Split {
                    feature_idx,
                    threshold: (pairs[i - 1].0 + pairs[i].0) / 2.0,
                    cost,
                });
            }
        }
    }

    best
}

/// Recursively builds a regression tree over the samples in `indices`.
fn build_regression_tree(
    x: &Matrix,
    y: &[f32],
    indices: &[usize],
    depth: usize,
    max_depth: Option<usize>,
    min_samples_split: usize,
    min_samples_leaf: usize,
) -> RegressionTreeNode {
    let n = indices.len();
    let sum: f32 = indices.iter().map(|&i| y[i]).sum();
    let mean = if n > 0 { sum / n as f32 } else { 0.0 };

    let leaf = RegressionTreeNode::Leaf(RegressionLeaf {
        value: mean,
        n_samples: n,
    });

    if n < min_samples_split {
        return leaf;
    }
    if let Some(max) = max_depth {
        if depth >= max {
            return leaf;
        }
    }

    let parent_sse = sse(y, indices);
    let Some(split) = find_best_split(x, y, indices, min_samples_leaf) else {
        return leaf;
    };
    if parent_sse - split.cost <= 1e-7 {
        return leaf;
    }

    let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .partition(|&&i| x.get(i, split.feature_idx) <= split.threshold);

    if left_idx.is_empty() || right_idx.is_empty() {
        return leaf;
    }

    RegressionTreeNode::Node(RegressionNode {
        feature_idx: split.feature_idx,
        threshold: split.threshold,
        left: Box::new(build_regression_tree(
            x,
            y,
            &left_idx,
            depth + 1,
            max_depth,
            min_samples_split,
            min_samples_leaf,
        )),
        right: Box::new(build_regression_tree(
            x,
            y,
            &right_idx,
            depth + 1,
            max_depth,
            min_samples_split,
            min_samples_leaf,
        )),
    })
}

/// Draws `n` sample indices with replacement.
fn bootstrap_sample(n: usize, seed: Option<u64>) -> Vec<usize> {
    let mut rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };
    (0..n).map(|_| rng.gen_range(0..n)).collect()
}

/// Decision tree regressor using the CART algorithm.
///
/// Uses squared-error reduction as the splitting criterion; leaves predict
/// the mean of their training targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTreeRegressor {
    tree: Option<RegressionTreeNode>,
    max_depth: Option<usize>,
    min_samples_split: usize,
    min_samples_leaf: usize,
}

impl Default for DecisionTreeRegressor {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTreeRegressor {
    /// Creates a regressor with default parameters (unbounded depth).
    #[must_use]
    pub fn new() -> Self {
        Self {
            tree: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }

    /// Sets the maximum tree depth.
    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Sets the minimum samples required to split a node (>= 2).
    #[must_use]
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples.max(2);
        self
    }

    /// Sets the minimum samples required at a leaf (>= 1).
    #[must_use]
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples.max(1);
        self
    }

    /// Returns the fitted tree depth, if fitted.
    #[must_use]
    pub fn tree_depth(&self) -> Option<usize> {
        self.tree.as_ref().map(RegressionTreeNode::depth)
    }

    /// Predicts the value for a single feature row.
    ///
    /// # Errors
    ///
    /// Returns an error if the model is not fitted.
    pub fn predict_one(&self, sample: &[f32]) -> Result<f32> {
        let mut node = self
            .tree
            .as_ref()
            .ok_or_else(|| PredecirError::not_fitted("DecisionTreeRegressor"))?;

        loop {
            match node {
                RegressionTreeNode::Leaf(leaf) => return Ok(leaf.value),
                RegressionTreeNode::Node(internal) => {
                    node = if sample[internal.feature_idx] <= internal.threshold {
                        &internal.left
                    } else {
                        &internal.right
                    };
                }
            }
        }
    }
}

impl Estimator for DecisionTreeRegressor {
    fn fit(&mut self, x: &Matrix, y: &Vector) -> Result<()> {
        let (n_rows, _) = x.shape();
        if n_rows != y.len() {
            return Err(PredecirError::dimension_mismatch("samples", n_rows, y.len()));
        }
        if n_rows == 0 {
            return Err(PredecirError::empty_input("DecisionTreeRegressor::fit"));
        }

        let indices: Vec<usize> = (0..n_rows).collect();
        self.tree = Some(build_regression_tree(
            x,
            y.as_slice(),
            &indices,
            0,
            self.max_depth,
            self.min_samples_split,
            self.min_samples_leaf,
        ));
        Ok(())
    }

    fn predict(&self, x: &Matrix) -> Result<Vector> {
        let n_samples = x.n_rows();
        let mut predictions = Vec::with_capacity(n_samples);
        for i in 0..n_samples {
            predictions.push(self.predict_one(x.row(i))?);
        }
        Ok(Vector::from_vec(predictions))
    }

    fn score(&self, x: &Matrix, y: &Vector) -> f32 {
        match self.predict(x) {
            Ok(predictions) => r_squared(&predictions, y),
            Err(_) => 0.0,
        }
    }
}

/// Random forest regressor.
///
/// Ensemble of decision tree regressors trained on bootstrap samples;
/// predictions are averaged across trees.
///
/// # Examples
///
/// ```
/// use predecir::tree::RandomForestRegressor;
/// use predecir::primitives::{Matrix, Vector};
/// use predecir::traits::Estimator;
///
/// let x = Matrix::from_vec(5, 1, vec![1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
/// let y = Vector::from_slice(&[2.0, 4.0, 6.0, 8.0, 10.0]);
///
/// let mut rf = RandomForestRegressor::new(10).with_max_depth(5).with_random_state(42);
/// rf.fit(&x, &y).unwrap();
/// assert_eq!(rf.predict(&x).unwrap().len(), 5);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    trees: Vec<DecisionTreeRegressor>,
    n_estimators: usize,
    max_depth: Option<usize>,
    min_samples_leaf: usize,
    random_state: Option<u64>,
}

impl RandomForestRegressor {
    /// Creates a forest with `n_estimators` trees.
    #[must_use]
    pub fn new(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators,
            max_depth: None,
            min_samples_leaf: 1,
            random_state: None,
        }
    }

    /// Sets the maximum depth for each tree.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// Sets the minimum samples required at a leaf.
    #[must_use]
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples.max(1);
        self
    }

    /// Sets the random seed for reproducible bootstrap samples.
    #[must_use]
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = Some(random_state);
        self
    }

    /// Returns the number of fitted trees.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Returns true if the forest has been fitted.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    /// Predicts the value for a single feature row.
    ///
    /// # Errors
    ///
    /// Returns an error if the forest is not fitted.
    pub fn predict_one(&self, sample: &[f32]) -> Result<f32> {
        if self.trees.is_empty() {
            return Err(PredecirError::not_fitted("RandomForestRegressor"));
        }
        let mut sum = 0.0f32;
        for tree in &self.trees {
            sum += tree.predict_one(sample)?;
        }
        Ok(sum / self.trees.len() as f32)
    }
}

impl Estimator for RandomForestRegressor {
    fn fit(&mut self, x: &Matrix, y: &Vector) -> Result<()> {
        let (n_samples, _) = x.shape();

        if n_samples != y.len() {
            return Err(PredecirError::dimension_mismatch(
                "samples",
                n_samples,
                y.len(),
            ));
        }
        if n_samples == 0 {
            return Err(PredecirError::empty_input("RandomForestRegressor::fit"));
        }
        if self.n_estimators == 0 {
            return Err(PredecirError::InvalidHyperparameter {
                param: "n_estimators".to_string(),
                value: "0".to_string(),
                constraint: ">= 1".to_string(),
            });
        }

        self.trees = Vec::with_capacity(self.n_estimators);

        for i in 0..self.n_estimators {
            let seed = self.random_state.map(|s| s + i as u64);
            let bootstrap_indices = bootstrap_sample(n_samples, seed);

            let bootstrap_x = x.select_rows(&bootstrap_indices);
            let bootstrap_y = Vector::from_vec(
                bootstrap_indices
                    .iter()
                    .map(|&idx| y.get(idx))
                    .collect(),
            );

            let mut tree = DecisionTreeRegressor::new()
                .with_min_samples_leaf(self.min_samples_leaf);
            if let Some(max_depth) = self.max_depth {
                tree = tree.with_max_depth(max_depth);
            }

            tree.fit(&bootstrap_x, &bootstrap_y)?;
            self.trees.push(tree);
        }

        Ok(())
    }

    fn predict(&self, x: &Matrix) -> Result<Vector> {
        if self.trees.is_empty() {
            return Err(PredecirError::not_fitted("RandomForestRegressor"));
        }

        let n_samples = x.n_rows();
        let mut predictions = vec![0.0f32; n_samples];

        for tree in &self.trees {
            let tree_preds = tree.predict(x)?;
            for (pred, &tree_pred) in predictions.iter_mut().zip(tree_preds.iter()) {
                *pred += tree_pred;
            }
        }

        let n_trees = self.trees.len() as f32;
        for pred in &mut predictions {
            *pred /= n_trees;
        }

        Ok(Vector::from_vec(predictions))
    }

    fn score(&self, x: &Matrix, y: &Vector) -> f32 {
        match self.predict(x) {
            Ok(predictions) => r_squared(&predictions, y),
            Err(_) => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_data(n: usize) -> (Matrix, Vector) {
        let x = Matrix::from_vec(n, 1, (0..n).map(|i| i as f32).collect()).unwrap();
        let y = Vector::from_vec((0..n).map(|i| 2.0 * i as f32 + 1.0).collect());
        (x, y)
    }

    #[test]
    fn test_tree_fits_training_data() {
        let (x, y) = linear_data(20);
        let mut tree = DecisionTreeRegressor::new();
        tree.fit(&x, &y).unwrap();
        let r2 = tree.score(&x, &y);
        assert!(r2 > 0.99, "unbounded tree should memorize, r2 = {r2}");
    }

    #[test]
    fn test_tree_max_depth_limits_depth() {
        let (x, y) = linear_data(64);
        let mut tree = DecisionTreeRegressor::new().with_max_depth(3);
        tree.fit(&x, &y).unwrap();
        assert!(tree.tree_depth().unwrap() <= 3);
    }

    #[test]
    fn test_tree_constant_target_is_single_leaf() {
        let x = Matrix::from_vec(5, 1, vec![1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        let y = Vector::from_slice(&[3.0; 5]);
        let mut tree = DecisionTreeRegressor::new();
        tree.fit(&x, &y).unwrap();
        assert_eq!(tree.tree_depth(), Some(0));
        assert_eq!(tree.predict_one(&[10.0]).unwrap(), 3.0);
    }

    #[test]
    fn test_tree_predict_before_fit_fails() {
        let tree = DecisionTreeRegressor::new();
        assert_eq!(tree.predict_one(&[1.0]).unwrap_err().kind(), "not_fitted");
    }

    #[test]
    fn test_tree_split_separates_step_function() {
        let x = Matrix::from_vec(6, 1, vec![1.0, 2.0, 3.0, 10.0, 11.0, 12.0]).unwrap();
        let y = Vector::from_slice(&[0.0, 0.0, 0.0, 100.0, 100.0, 100.0]);
        let mut tree = DecisionTreeRegressor::new().with_max_depth(1);
        tree.fit(&x, &y).unwrap();
        assert_eq!(tree.predict_one(&[2.0]).unwrap(), 0.0);
        assert_eq!(tree.predict_one(&[11.0]).unwrap(), 100.0);
    }

    #[test]
    fn test_forest_fit_predict() {
        let (x, y) = linear_data(30);
        let mut rf = RandomForestRegressor::new(10)
            .with_max_depth(6)
            .with_random_state(42);
        rf.fit(&x, &y).unwrap();
        assert_eq!(rf.n_trees(), 10);
        let r2 = rf.score(&x, &y);
        assert!(r2 > 0.9, "forest r2 = {r2}");
    }

    #[test]
    fn test_forest_reproducible_with_seed() {
        let (x, y) = linear_data(30);
        let mut a = RandomForestRegressor::new(5).with_random_state(42);
        let mut b = RandomForestRegressor::new(5).with_random_state(42);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        let pa = a.predict(&x).unwrap();
        let pb = b.predict(&x).unwrap();
        assert_eq!(pa.as_slice(), pb.as_slice());
    }

    #[test]
    fn test_forest_unfitted_predict_fails() {
        let rf = RandomForestRegressor::new(3);
        let (x, _) = linear_data(5);
        assert_eq!(rf.predict(&x).unwrap_err().kind(), "not_fitted");
    }

    #[test]
    fn test_forest_zero_estimators_rejected() {
        let (x, y) = linear_data(5);
        let mut rf = RandomForestRegressor::new(0);
        assert!(rf.fit(&x, &y).is_err());
    }

    #[test]
    fn test_bootstrap_sample_seeded() {
        let a = bootstrap_sample(10, Some(3));
        let b = bootstrap_sample(10, Some(3));
        assert_eq!(a, b);
        assert_eq!(a.len(), 10);
        assert!(a.iter().all(|&i| i < 10));
    }
}
