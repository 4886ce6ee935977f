//! Error taxonomy for the pipeline.
//!
//! Only the loader and the output writers can fail. Field extraction, dataset
//! normalization and key validation are total functions.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a pipeline run
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A file matched the extract naming pattern but is not usable structured data
    #[error("Malformed extract {}: {reason}", path.display())]
    MalformedExtract { path: PathBuf, reason: String },

    /// No booked transactions across all extract files
    #[error("No transaction extracts found in {}. Download data first.", dir.display())]
    NoDataFound { dir: PathBuf },

    /// Filesystem error on a specific path
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV serialization error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid settings
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
