//! Error types for predecir operations.
//!
//! One enum covers both the embedded estimators (dimension mismatches,
//! unfitted models) and the service boundary (invalid requests, missing
//! artifacts, schema drift). Each variant maps to a stable `kind()` string
//! that the JSON service wrappers surface to callers.

use std::fmt;

/// Main error type for predecir operations.
///
/// # Examples
///
/// ```
/// use predecir::error::PredecirError;
///
/// let err = PredecirError::InvalidInput {
///     field: "latitude".to_string(),
///     message: "missing or not a number".to_string(),
/// };
/// assert_eq!(err.kind(), "invalid_input");
/// assert!(err.to_string().contains("latitude"));
/// ```
#[derive(Debug)]
pub enum PredecirError {
    /// A request field is missing, malformed, or out of range.
    InvalidInput {
        /// Field name as it appears in the request mapping
        field: String,
        /// What was wrong with it
        message: String,
    },

    /// No persisted model artifact exists and the context is not allowed
    /// to train one.
    ModelUnavailable {
        /// Path that was probed for the artifact
        path: String,
    },

    /// A persisted feature schema does not match the layout this library
    /// version expands inputs into.
    SchemaMismatch {
        /// Schema description expected by the current code
        expected: String,
        /// Schema description found in the artifact
        actual: String,
    },

    /// An estimator or transformer was used before `fit`.
    NotFitted {
        /// Component that was not fitted
        what: String,
    },

    /// Matrix/vector dimensions don't match for the operation.
    DimensionMismatch {
        /// Expected dimensions description
        expected: String,
        /// Actual dimensions found
        actual: String,
    },

    /// Invalid hyperparameter value provided.
    InvalidHyperparameter {
        /// Parameter name
        param: String,
        /// Provided value
        value: String,
        /// Constraint description
        constraint: String,
    },

    /// I/O error (file not found, permission denied, etc.).
    Io(std::io::Error),

    /// Serialization/deserialization error.
    Serialization(String),

    /// Generic error with string message.
    Other(String),
}

impl PredecirError {
    /// Stable machine-readable kind for the service error envelope.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            PredecirError::InvalidInput { .. } => "invalid_input",
            PredecirError::ModelUnavailable { .. } => "model_unavailable",
            PredecirError::SchemaMismatch { .. } => "schema_mismatch",
            PredecirError::NotFitted { .. } => "not_fitted",
            PredecirError::DimensionMismatch { .. } => "dimension_mismatch",
            PredecirError::InvalidHyperparameter { .. } => "invalid_hyperparameter",
            PredecirError::Io(_) => "io",
            PredecirError::Serialization(_) => "serialization",
            PredecirError::Other(_) => "other",
        }
    }

    /// Create an invalid-input error for a request field.
    #[must_use]
    pub fn invalid_input(field: &str, message: &str) -> Self {
        Self::InvalidInput {
            field: field.to_string(),
            message: message.to_string(),
        }
    }

    /// Create a dimension mismatch error with descriptive context.
    #[must_use]
    pub fn dimension_mismatch(context: &str, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            expected: format!("{context}={expected}"),
            actual: format!("{actual}"),
        }
    }

    /// Create a not-fitted error.
    #[must_use]
    pub fn not_fitted(what: &str) -> Self {
        Self::NotFitted {
            what: what.to_string(),
        }
    }

    /// Create an empty input error.
    #[must_use]
    pub fn empty_input(context: &str) -> Self {
        Self::Other(format!("empty input: {context}"))
    }
}

impl fmt::Display for PredecirError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredecirError::InvalidInput { field, message } => {
                write!(f, "Invalid input: {field}: {message}")
            }
            PredecirError::ModelUnavailable { path } => {
                write!(f, "Model artifact not available at {path}")
            }
            PredecirError::SchemaMismatch { expected, actual } => {
                write!(
                    f,
                    "Feature schema mismatch: expected {expected}, got {actual}"
                )
            }
            PredecirError::NotFitted { what } => {
                write!(f, "{what} is not fitted. Call fit() first")
            }
            PredecirError::DimensionMismatch { expected, actual } => {
                write!(f, "Dimension mismatch: expected {expected}, got {actual}")
            }
            PredecirError::InvalidHyperparameter {
                param,
                value,
                constraint,
            } => {
                write!(
                    f,
                    "Invalid hyperparameter: {param} = {value}, expected {constraint}"
                )
            }
            PredecirError::Io(e) => write!(f, "I/O error: {e}"),
            PredecirError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            PredecirError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for PredecirError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PredecirError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PredecirError {
    fn from(err: std::io::Error) -> Self {
        PredecirError::Io(err)
    }
}

impl From<csv::Error> for PredecirError {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            match err.into_kind() {
                csv::ErrorKind::Io(e) => PredecirError::Io(e),
                other => PredecirError::Serialization(format!("CSV error: {other:?}")),
            }
        } else {
            PredecirError::Serialization(format!("CSV error: {err}"))
        }
    }
}

impl From<&str> for PredecirError {
    fn from(msg: &str) -> Self {
        PredecirError::Other(msg.to_string())
    }
}

impl From<String> for PredecirError {
    fn from(msg: String) -> Self {
        PredecirError::Other(msg)
    }
}

/// Convenience type alias for Results.
pub type Result<T> = std::result::Result<T, PredecirError>;
