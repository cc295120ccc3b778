//! Lazy scans over source files.

use std::num::NonZeroUsize;
use std::path::Path;

use pipe_model::FileType;
use polars::prelude::{
    LazyCsvReader, LazyFileListReader, LazyFrame, LazyJsonLineReader, PlPath, ScanArgsParquet,
};
use tracing::{debug, info};

use crate::error::{IngestError, Result};

/// Options applied to text formats. Parquet carries its own schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Rows used for schema inference; `None` scans the whole file.
    pub infer_schema_length: Option<usize>,
    pub has_header: bool,
    pub separator: u8,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            infer_schema_length: Some(1_000),
            has_header: true,
            separator: b',',
        }
    }
}

/// Build a deferred scan over `path` and resolve its schema.
///
/// Resolving the schema up front turns unreadable or malformed sources into
/// an ingestion error instead of a failure during the first chunk.
pub fn scan_source(path: &Path, file_type: FileType, options: &ScanOptions) -> Result<LazyFrame> {
    if !path.exists() {
        return Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let location = PlPath::new(&path.to_string_lossy());
    debug!(path = %path.display(), file_type = %file_type, "Scanning source");

    let scanned = match file_type {
        FileType::Csv => LazyCsvReader::new(location)
            .with_has_header(options.has_header)
            .with_separator(options.separator)
            .with_infer_schema_length(options.infer_schema_length)
            .finish(),
        FileType::Parquet => LazyFrame::scan_parquet(location, ScanArgsParquet::default()),
        FileType::Ndjson => LazyJsonLineReader::new(location)
            .with_infer_schema_length(options.infer_schema_length.and_then(NonZeroUsize::new))
            .finish(),
    };
    let mut lf = scanned.map_err(|source| IngestError::Scan {
        path: path.to_path_buf(),
        file_type: file_type.as_str(),
        source,
    })?;

    let schema = lf.collect_schema().map_err(|source| IngestError::Schema {
        path: path.to_path_buf(),
        source,
    })?;
    info!(
        path = %path.display(),
        file_type = %file_type,
        columns = schema.len(),
        "Source opened"
    );
    Ok(lf)
}
