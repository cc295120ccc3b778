//! Destinations for materialized chunks.

use std::convert::Infallible;

use polars::prelude::DataFrame;

use crate::chunk::ChunkBounds;
use crate::provenance::Provenance;

/// Materialized outputs of one chunk.
#[derive(Debug, Clone)]
pub struct ChunkFrames {
    pub bounds: ChunkBounds,
    pub transformed: DataFrame,
    pub invalid: DataFrame,
    pub pre_stats: DataFrame,
    pub post_stats: DataFrame,
}

/// Receives the provenance record once, then every chunk in order.
pub trait ChunkSink {
    type Error: std::error::Error + Send + Sync + 'static;

    fn write_provenance(&mut self, provenance: &Provenance) -> Result<(), Self::Error>;

    fn write_chunk(&mut self, chunk: &mut ChunkFrames) -> Result<(), Self::Error>;
}

/// Keeps every chunk in memory. Intended for tests and small datasets.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub provenance: Option<Provenance>,
    pub chunks: Vec<ChunkFrames>,
}

impl ChunkSink for MemorySink {
    type Error = Infallible;

    fn write_provenance(&mut self, provenance: &Provenance) -> Result<(), Self::Error> {
        self.provenance = Some(provenance.clone());
        Ok(())
    }

    fn write_chunk(&mut self, chunk: &mut ChunkFrames) -> Result<(), Self::Error> {
        self.chunks.push(chunk.clone());
        Ok(())
    }
}
