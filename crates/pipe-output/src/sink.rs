//! Directory-backed chunk sink.

use std::fs;

use pipe_core::{ChunkFrames, ChunkSink, Provenance};
use tracing::info;

use crate::error::{OutputError, Result};
use crate::layout::{OutputKind, OutputLayout};
use crate::writer::{ensure_parent_dir, write_frame};

/// Persists a run under `{dst_root}/{guid}`.
///
/// Every chunk produces one part file per [`OutputKind`], including an empty
/// `error_records` part when the chunk had no invalid rows.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    layout: OutputLayout,
}

impl DirectorySink {
    pub fn new(layout: OutputLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }
}

impl ChunkSink for DirectorySink {
    type Error = OutputError;

    fn write_provenance(&mut self, provenance: &Provenance) -> Result<()> {
        let path = self.layout.provenance_path(&provenance.file_stem());
        ensure_parent_dir(&path)?;
        let json = provenance.to_json_pretty()?;
        fs::write(&path, json).map_err(|source| OutputError::WriteText {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), "Provenance record written");
        Ok(())
    }

    fn write_chunk(&mut self, chunk: &mut ChunkFrames) -> Result<()> {
        let index = chunk.bounds.index;
        let file_type = self.layout.file_type();
        for kind in OutputKind::ALL {
            let frame = match kind {
                OutputKind::TransformedData => &mut chunk.transformed,
                OutputKind::ErrorRecords => &mut chunk.invalid,
                OutputKind::PreTransformStats => &mut chunk.pre_stats,
                OutputKind::PostTransformStats => &mut chunk.post_stats,
            };
            write_frame(frame, &self.layout.part_path(kind, index), file_type)?;
        }
        Ok(())
    }
}
