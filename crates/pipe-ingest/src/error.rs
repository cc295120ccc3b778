//! Error types for source ingestion.

use std::path::PathBuf;

use polars::prelude::PolarsError;
use thiserror::Error;

/// Errors that can occur while opening a source.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Source file not found.
    #[error("source file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// The engine could not build a scan over the source.
    #[error("failed to scan {file_type} source {path}: {source}")]
    Scan {
        path: PathBuf,
        file_type: &'static str,
        #[source]
        source: PolarsError,
    },

    /// The source schema could not be resolved.
    #[error("failed to read schema of {path}: {source}")]
    Schema {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
