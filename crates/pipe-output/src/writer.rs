//! Frame writers for each destination format.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use pipe_model::FileType;
use polars::prelude::{
    CsvWriter, DataFrame, JsonFormat, JsonWriter, ParquetWriter, PolarsResult, SerWriter,
};
use tracing::debug;

use crate::error::{OutputError, Result};

/// Create the parent directory of `path` if needed.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| OutputError::Create {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

/// Write `df` to `path` in `file_type`, replacing any existing file.
pub fn write_frame(df: &mut DataFrame, path: &Path, file_type: FileType) -> Result<()> {
    ensure_parent_dir(path)?;
    let file = File::create(path).map_err(|source| OutputError::Create {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);

    encode(df, &mut writer, file_type).map_err(|source| OutputError::WriteFrame {
        path: path.to_path_buf(),
        source,
    })?;
    writer.flush().map_err(|source| OutputError::WriteText {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(
        path = %path.display(),
        rows = df.height(),
        file_type = %file_type,
        "Frame written"
    );
    Ok(())
}

fn encode(df: &mut DataFrame, writer: &mut BufWriter<File>, file_type: FileType) -> PolarsResult<()> {
    match file_type {
        FileType::Parquet => ParquetWriter::new(writer).finish(df).map(|_| ()),
        FileType::Csv => CsvWriter::new(writer).include_header(true).finish(df),
        FileType::Ndjson => JsonWriter::new(writer)
            .with_json_format(JsonFormat::JsonLines)
            .finish(df),
    }
}
