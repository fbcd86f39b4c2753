//! Core numeric primitives (Vector, Matrix).
//!
//! Row-major `f32` containers shared by every estimator in the crate.

mod matrix;
mod vector;

pub use matrix::Matrix;
pub use vector::Vector;
