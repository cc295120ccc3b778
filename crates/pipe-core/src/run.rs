//! Chunked execution.
//!
//! `prepare` composes the full plan once against the whole source, so every
//! schema and configuration error surfaces before anything is written, and
//! decides the chunk bounds. `execute` then writes the provenance record and
//! materializes each chunk in turn: slice the source, compose the stages over
//! that slice, collect the four outputs and hand them to the sink. At most one
//! chunk is held in memory at a time.
//!
//! Deduplication and validation only see the rows of their own chunk.

use pipe_model::Result;
use polars::prelude::{IdxSize, IntoLazy, LazyFrame};
use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use crate::chunk::{ChunkBounds, ChunkPlan, plan_chunks};
use crate::error::RunError;
use crate::pipeline::Pipeline;
use crate::provenance::Provenance;
use crate::sink::{ChunkFrames, ChunkSink};

/// Row counts for one persisted chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChunkSummary {
    pub index: usize,
    pub input_rows: u64,
    pub valid_rows: u64,
    pub invalid_rows: u64,
    pub transformed_rows: u64,
}

impl ChunkSummary {
    fn from_frames(frames: &ChunkFrames) -> Self {
        let invalid_rows = frames.invalid.height() as u64;
        Self {
            index: frames.bounds.index,
            input_rows: frames.bounds.len,
            valid_rows: frames.bounds.len.saturating_sub(invalid_rows),
            invalid_rows,
            transformed_rows: frames.transformed.height() as u64,
        }
    }
}

/// Outcome of a complete run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub process_name: String,
    pub guid: String,
    pub chunk_plan: ChunkPlan,
    pub chunks: Vec<ChunkSummary>,
}

impl RunSummary {
    pub fn input_rows(&self) -> u64 {
        self.chunks.iter().map(|c| c.input_rows).sum()
    }

    pub fn valid_rows(&self) -> u64 {
        self.chunks.iter().map(|c| c.valid_rows).sum()
    }

    pub fn invalid_rows(&self) -> u64 {
        self.chunks.iter().map(|c| c.invalid_rows).sum()
    }

    pub fn transformed_rows(&self) -> u64 {
        self.chunks.iter().map(|c| c.transformed_rows).sum()
    }
}

/// A run whose plan has been composed and chunked but not executed.
pub struct PreparedRun {
    source: LazyFrame,
    pub provenance: Provenance,
}

impl PreparedRun {
    pub fn chunk_plan(&self) -> &ChunkPlan {
        &self.provenance.chunk_plan
    }

    pub fn optimized_plan(&self) -> &str {
        &self.provenance.optimized_plan
    }
}

/// Compose the full plan, render it, and plan the chunks.
pub fn prepare(pipeline: &Pipeline, source: LazyFrame) -> Result<PreparedRun> {
    let ctx = pipeline.context();
    let config = pipeline.config();
    let span = info_span!("prepare", process = %ctx.process_name, guid = %ctx.guid);
    let _guard = span.enter();

    let composed = pipeline.compose(source.clone())?;
    let optimized_plan = composed.explain()?;
    let chunk_plan = plan_chunks(&source, config.chunk_budget())?;

    if config.transformations.deduplicate.is_some() && chunk_plan.chunk_count() > 1 {
        warn!(
            chunks = chunk_plan.chunk_count(),
            "Deduplication only removes duplicates within each chunk"
        );
    }
    info!(
        rows = chunk_plan.estimate.rows,
        estimated_bytes = chunk_plan.estimate.bytes,
        budget_bytes = chunk_plan.budget_bytes,
        chunks = chunk_plan.chunk_count(),
        "Run planned"
    );

    let provenance = Provenance::new(config, ctx, chunk_plan, optimized_plan);
    Ok(PreparedRun { source, provenance })
}

/// Write provenance, then materialize and persist every chunk in order.
///
/// `on_chunk` is called after each chunk is persisted.
pub fn execute<S, F>(
    pipeline: &Pipeline,
    prepared: &PreparedRun,
    sink: &mut S,
    mut on_chunk: F,
) -> std::result::Result<RunSummary, RunError<S::Error>>
where
    S: ChunkSink,
    F: FnMut(&ChunkSummary),
{
    let ctx = pipeline.context();
    sink.write_provenance(&prepared.provenance)
        .map_err(|e| RunError::sink("provenance record", e))?;

    let mut chunks = Vec::with_capacity(prepared.chunk_plan().chunk_count());
    for bounds in &prepared.chunk_plan().chunks {
        let span = info_span!("chunk", index = bounds.index, offset = bounds.offset, rows = bounds.len);
        let _guard = span.enter();

        let mut frames = materialize_chunk(pipeline, &prepared.source, *bounds)?;
        let summary = ChunkSummary::from_frames(&frames);
        sink.write_chunk(&mut frames)
            .map_err(|e| RunError::sink(format!("chunk {}", bounds.index), e))?;

        info!(
            valid = summary.valid_rows,
            invalid = summary.invalid_rows,
            transformed = summary.transformed_rows,
            "Chunk persisted"
        );
        on_chunk(&summary);
        chunks.push(summary);
    }

    Ok(RunSummary {
        process_name: ctx.process_name.clone(),
        guid: ctx.guid.clone(),
        chunk_plan: prepared.chunk_plan().clone(),
        chunks,
    })
}

/// `prepare` followed by `execute`.
pub fn run<S, F>(
    pipeline: &Pipeline,
    source: LazyFrame,
    sink: &mut S,
    on_chunk: F,
) -> std::result::Result<RunSummary, RunError<S::Error>>
where
    S: ChunkSink,
    F: FnMut(&ChunkSummary),
{
    let prepared = prepare(pipeline, source)?;
    execute(pipeline, &prepared, sink, on_chunk)
}

fn materialize_chunk(
    pipeline: &Pipeline,
    source: &LazyFrame,
    bounds: ChunkBounds,
) -> Result<ChunkFrames> {
    let offset = i64::try_from(bounds.offset).unwrap_or(i64::MAX);
    let len = IdxSize::try_from(bounds.len).unwrap_or(IdxSize::MAX);
    let data = source.clone().slice(offset, len).collect()?;
    debug!(rows = data.height(), "Chunk source materialized");

    let composed = pipeline.compose(data.lazy())?;
    Ok(ChunkFrames {
        bounds,
        transformed: composed.transformed.collect()?,
        invalid: composed.invalid.collect()?,
        pre_stats: composed.pre_stats.collect()?,
        post_stats: composed.post_stats.collect()?,
    })
}
