//! Error types for apisnap-core.

use thiserror::Error;

use crate::differ::ErrorReport;

/// Result type alias for apisnap-core operations.
pub type Result<T> = std::result::Result<T, SignatureError>;

/// Errors that can occur while building, checking or persisting signatures.
#[derive(Error, Debug)]
pub enum SignatureError {
    /// The target path (or its trailing `:member`) does not exist.
    #[error("Cannot resolve '{path}': {message}")]
    Resolution {
        /// Target path as given by the caller.
        path: String,
        /// Description of what could not be found.
        message: String,
    },

    /// A freshly built signature does not match its baseline.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Persisted snapshot data is malformed, truncated or of an unknown version.
    #[error("Invalid snapshot data: {message}")]
    Serialization {
        /// Description of the decoding failure.
        message: String,
    },

    /// The host failed to answer a reflection query.
    #[error("Reflection failed at '{path}': {message}")]
    Reflection {
        /// Dotted path of the object being inspected.
        path: String,
        /// Host-provided failure description.
        message: String,
    },

    /// IO error reading or writing snapshot files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for SignatureError {
    fn from(err: serde_json::Error) -> Self {
        SignatureError::Serialization {
            message: err.to_string(),
        }
    }
}

impl SignatureError {
    /// Build a resolution error for `path`.
    pub fn resolution(path: impl Into<String>, message: impl Into<String>) -> Self {
        SignatureError::Resolution {
            path: path.into(),
            message: message.into(),
        }
    }

    /// The structured report, if this is a validation failure.
    pub fn report(&self) -> Option<&ErrorReport> {
        match self {
            SignatureError::Validation(err) => Some(&err.report),
            _ => None,
        }
    }
}

/// A signature check failed; carries the complete mismatch report.
#[derive(Error, Debug, Clone)]
#[error(
    "API of '{target}' does not match its baseline ({} difference(s))",
    .report.entries().len()
)]
pub struct ValidationError {
    /// Target path that was checked.
    pub target: String,
    /// Full structured report, never truncated.
    pub report: ErrorReport,
}

impl ValidationError {
    pub fn new(target: impl Into<String>, report: ErrorReport) -> Self {
        Self {
            target: target.into(),
            report,
        }
    }
}
