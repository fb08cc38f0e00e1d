//! Error handling for the triage engine.

pub mod util;

use std::io;
use std::path::{Path, PathBuf};

use arrow::error::ArrowError;
use parquet::errors::ParquetError;

/// Specialized error type for training, inference and evaluation
#[derive(Debug, thiserror::Error)]
pub enum TriageError {
    /// A required artifact or reference table is missing, unreadable or malformed
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Training or evaluation data cannot be used as given
    #[error("Data error: {0}")]
    DataError(String),

    /// The classifier did not produce a result in time
    #[error("Inference unavailable: {0}")]
    InferenceUnavailable(String),

    /// Error opening, reading or writing a file
    #[error("IO error: {message}{}", .path.as_ref().map(|p| format!(" ({})", p.display())).unwrap_or_default())]
    IoError {
        /// What went wrong
        message: String,
        /// The file involved, when known
        path: Option<PathBuf>,
        /// Underlying IO error
        #[source]
        source: Option<io::Error>,
    },

    /// Error processing Arrow data
    #[error("Arrow error: {0}")]
    ArrowError(#[from] ArrowError),

    /// Error processing Parquet data
    #[error("Parquet error: {0}")]
    ParquetError(#[from] ParquetError),

    /// Error encoding or decoding JSON
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl From<io::Error> for TriageError {
    fn from(error: io::Error) -> Self {
        Self::IoError {
            message: error.to_string(),
            path: None,
            source: Some(error),
        }
    }
}

impl TriageError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError(message.into())
    }

    /// Create a data error
    pub fn data(message: impl Into<String>) -> Self {
        Self::DataError(message.into())
    }

    /// Create an IO error without an underlying source
    pub fn io_error(message: impl Into<String>) -> Self {
        Self::IoError {
            message: message.into(),
            path: None,
            source: None,
        }
    }

    /// Create an IO error wrapping the original `io::Error`
    pub fn io_error_with_source(message: impl Into<String>, source: io::Error) -> Self {
        Self::IoError {
            message: message.into(),
            path: None,
            source: Some(source),
        }
    }

    /// Attach a path to an IO error. Other variants are returned unchanged.
    #[must_use]
    pub fn with_path(self, path: &Path) -> Self {
        match self {
            Self::IoError {
                message, source, ..
            } => Self::IoError {
                message,
                path: Some(path.to_path_buf()),
                source,
            },
            other => other,
        }
    }

    /// Whether the caller may retry or fall back (e.g. to the rule-based path)
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::InferenceUnavailable(_))
    }
}

/// Result type for triage operations
pub type Result<T> = std::result::Result<T, TriageError>;
