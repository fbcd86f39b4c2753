//! Train/test splitting.

use crate::error::{PredecirError, Result};
use crate::primitives::{Matrix, Vector};
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Validates inputs and returns (n_train, n_test).
fn validate_split_inputs(x: &Matrix, y: &Vector, test_size: f32) -> Result<(usize, usize)> {
    if test_size <= 0.0 || test_size >= 1.0 {
        return Err(PredecirError::InvalidHyperparameter {
            param: "test_size".to_string(),
            value: format!("{test_size}"),
            constraint: "0 < test_size < 1".to_string(),
        });
    }

    let (n_samples, _) = x.shape();
    if n_samples != y.len() {
        return Err(PredecirError::dimension_mismatch(
            "samples",
            n_samples,
            y.len(),
        ));
    }

    let n_test = (n_samples as f32 * test_size).round() as usize;
    let n_train = n_samples - n_test;

    if n_test == 0 || n_train == 0 {
        return Err(PredecirError::Other(format!(
            "split would leave an empty set (n_train={n_train}, n_test={n_test})"
        )));
    }

    Ok((n_train, n_test))
}

/// Shuffles sample indices with an optional seed.
fn shuffle_indices(n_samples: usize, random_state: Option<u64>) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..n_samples).collect();

    if let Some(seed) = random_state {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        indices.shuffle(&mut rng);
    } else {
        let mut rng = rand::thread_rng();
        indices.shuffle(&mut rng);
    }

    indices
}

/// Splits features and target into train and test subsets.
///
/// Returns `(x_train, x_test, y_train, y_test)`. A fixed `random_state`
/// reproduces the same split.
///
/// # Examples
///
/// ```
/// use predecir::model_selection::train_test_split;
/// use predecir::primitives::{Matrix, Vector};
///
/// let x = Matrix::from_vec(10, 2, (0..20).map(|i| i as f32).collect()).unwrap();
/// let y = Vector::from_vec((0..10).map(|i| i as f32).collect());
///
/// let (x_train, x_test, y_train, y_test) =
///     train_test_split(&x, &y, 0.2, Some(42)).unwrap();
/// assert_eq!(x_train.n_rows(), 8);
/// assert_eq!(x_test.n_rows(), 2);
/// assert_eq!(y_train.len(), 8);
/// assert_eq!(y_test.len(), 2);
/// ```
///
/// # Errors
///
/// Returns an error if `test_size` is out of range, dimensions disagree, or
/// either resulting set would be empty.
#[allow(clippy::type_complexity)]
pub fn train_test_split(
    x: &Matrix,
    y: &Vector,
    test_size: f32,
    random_state: Option<u64>,
) -> Result<(Matrix, Matrix, Vector, Vector)> {
    let (n_train, _) = validate_split_inputs(x, y, test_size)?;
    let n_samples = x.n_rows();

    let indices = shuffle_indices(n_samples, random_state);
    let train_indices = &indices[..n_train];
    let test_indices = &indices[n_train..];

    Ok((
        x.select_rows(train_indices),
        x.select_rows(test_indices),
        y.select(train_indices),
        y.select(test_indices),
    ))
}
