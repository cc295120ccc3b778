//! Error types for output persistence.

use std::path::PathBuf;

use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutputError {
    /// Failed to create an output directory or file.
    #[error("failed to create {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a frame.
    #[error("failed to write {path}: {source}")]
    WriteFrame {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },

    /// Failed to serialize the provenance record.
    #[error("failed to serialize provenance record: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Failed to write a text artifact.
    #[error("failed to write {path}: {source}")]
    WriteText {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for output operations.
pub type Result<T> = std::result::Result<T, OutputError>;
