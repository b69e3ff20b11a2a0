//! Error types for the CarbonLens library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for CarbonLens operations.
#[derive(Debug, Error)]
pub enum CarbonLensError {
    /// The dataset could not be loaded. Fatal at startup.
    #[error("Failed to load dataset '{path}': {reason}")]
    DataLoad { path: PathBuf, reason: String },

    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The text-generation collaborator could not be reached or answered badly.
    #[error("Generation error: {0}")]
    Generation(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Regex compilation error.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl CarbonLensError {
    /// Build a [`CarbonLensError::DataLoad`] for the given path.
    pub fn data_load(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        CarbonLensError::DataLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for CarbonLens operations.
pub type Result<T> = std::result::Result<T, CarbonLensError>;
