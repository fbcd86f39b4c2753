//! Model artifact persistence.
//!
//! Bundles are written as one bincode file per pipeline. A bundle always
//! carries the fitted model together with its fitted scaler and the exact
//! feature layout used at training time; the pieces are never stored
//! separately.

use crate::error::{PredecirError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

/// Policy for contexts whose artifact is missing on first use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrainPolicy {
    /// Surface `ModelUnavailable` when the artifact does not exist.
    #[default]
    RequireExisting,
    /// Train on generated mock data and persist the result. Demo
    /// convenience, opt-in only.
    TrainOnMockIfMissing,
}

/// Serializes a bundle to `path` with bincode.
///
/// # Errors
///
/// Returns an error if serialization or the file write fails.
pub fn save_bundle<T: Serialize, P: AsRef<Path>>(bundle: &T, path: P) -> Result<()> {
    let bytes = bincode::serialize(bundle)
        .map_err(|e| PredecirError::Serialization(format!("encode failed: {e}")))?;
    fs::write(path.as_ref(), bytes)?;
    info!(path = %path.as_ref().display(), "model bundle saved");
    Ok(())
}

/// Deserializes a bundle from `path`.
///
/// A missing file is `ModelUnavailable`; any other read or decode failure
/// keeps its own kind.
///
/// # Errors
///
/// Returns `ModelUnavailable` if the file does not exist, `Io` for other
/// read failures, or `Serialization` if decoding fails.
pub fn load_bundle<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(PredecirError::ModelUnavailable {
            path: path.display().to_string(),
        });
    }
    let bytes = fs::read(path)?;
    let bundle = bincode::deserialize(&bytes)
        .map_err(|e| PredecirError::Serialization(format!("decode failed: {e}")))?;
    info!(path = %path.display(), "model bundle loaded");
    Ok(bundle)
}
