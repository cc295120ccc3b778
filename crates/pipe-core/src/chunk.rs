//! Chunk planning.
//!
//! The dataset size is estimated from the row count and a sampled per-row
//! footprint. The chunk count keeps each chunk's estimated footprint within
//! the byte budget; bounds are disjoint, contiguous and cover every row once.

use pipe_model::Result;
use polars::prelude::{DataType, IdxSize, LazyFrame, len};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Rows materialized to estimate the per-row footprint.
pub const SAMPLE_ROWS: IdxSize = 1_000;

/// Per-row width assumed for variable-width columns when no sample is available.
const VARIABLE_WIDTH_BYTES: u64 = 32;

const ROW_COUNT_COL: &str = "__pipe_row_count";

/// One chunk: `len` rows starting at `offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkBounds {
    pub index: usize,
    pub offset: u64,
    pub len: u64,
}

/// Estimated size of a deferred dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeEstimate {
    pub rows: u64,
    pub bytes: u64,
}

/// Chunking decision for a run, recorded in the provenance artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkPlan {
    pub estimate: SizeEstimate,
    pub budget_bytes: u64,
    pub chunks: Vec<ChunkBounds>,
}

impl ChunkPlan {
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }
}

/// Number of chunks needed to keep each under `budget_bytes` (at least one).
pub fn chunk_count(estimated_bytes: u64, budget_bytes: u64) -> usize {
    let budget = budget_bytes.max(1);
    let count = estimated_bytes.div_ceil(budget).max(1);
    usize::try_from(count).unwrap_or(usize::MAX)
}

/// Split `total_rows` into `count` contiguous, order-preserving chunks.
///
/// Earlier chunks take the remainder, so sizes differ by at most one row.
/// The count is capped at the row count; an empty dataset yields a single
/// empty chunk so every run produces one set of outputs.
pub fn chunk_bounds(total_rows: u64, count: usize) -> Vec<ChunkBounds> {
    let count = (count.max(1) as u64).min(total_rows.max(1));
    let base = total_rows / count;
    let remainder = total_rows % count;

    let mut offset = 0;
    (0..count)
        .map(|i| {
            let len = base + u64::from(i < remainder);
            let bounds = ChunkBounds {
                index: i as usize,
                offset,
                len,
            };
            offset += len;
            bounds
        })
        .collect()
}

/// Estimate rows and bytes without materializing the whole dataset.
pub fn estimate_size(source: &LazyFrame) -> Result<SizeEstimate> {
    let counted = source
        .clone()
        .select([len().cast(DataType::UInt64).alias(ROW_COUNT_COL)])
        .collect()?;
    let rows = counted
        .column(ROW_COUNT_COL)?
        .u64()?
        .get(0)
        .unwrap_or(0);

    let sample = source.clone().limit(SAMPLE_ROWS).collect()?;
    let bytes_per_row = if sample.height() > 0 {
        (sample.estimated_size() as u64).div_ceil(sample.height() as u64)
    } else {
        sample
            .get_columns()
            .iter()
            .map(|c| fixed_width(c.dtype()))
            .sum()
    };

    let bytes = rows.saturating_mul(bytes_per_row.max(1));
    debug!(rows, bytes_per_row, bytes, "Estimated dataset size");
    Ok(SizeEstimate { rows, bytes })
}

/// Estimate the source and derive chunk bounds for `budget_bytes`.
pub fn plan_chunks(source: &LazyFrame, budget_bytes: u64) -> Result<ChunkPlan> {
    let estimate = estimate_size(source)?;
    let count = chunk_count(estimate.bytes, budget_bytes);
    Ok(ChunkPlan {
        estimate,
        budget_bytes,
        chunks: chunk_bounds(estimate.rows, count),
    })
}

fn fixed_width(dtype: &DataType) -> u64 {
    match dtype {
        DataType::Boolean | DataType::Int8 | DataType::UInt8 => 1,
        DataType::Int16 | DataType::UInt16 => 2,
        DataType::Int32 | DataType::UInt32 | DataType::Float32 | DataType::Date => 4,
        DataType::Int64 | DataType::UInt64 | DataType::Float64 | DataType::Datetime(_, _) => 8,
        _ => VARIABLE_WIDTH_BYTES,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_count_rounds_up() {
        assert_eq!(chunk_count(0, 100), 1);
        assert_eq!(chunk_count(100, 100), 1);
        assert_eq!(chunk_count(101, 100), 2);
        assert_eq!(chunk_count(1_000, 1), 1_000);
    }

    #[test]
    fn bounds_spread_the_remainder() {
        let bounds = chunk_bounds(10, 3);
        let lens: Vec<u64> = bounds.iter().map(|b| b.len).collect();
        let offsets: Vec<u64> = bounds.iter().map(|b| b.offset).collect();
        assert_eq!(lens, [4, 3, 3]);
        assert_eq!(offsets, [0, 4, 7]);
    }

    #[test]
    fn bounds_never_exceed_rows() {
        assert_eq!(chunk_bounds(2, 5).len(), 2);
        let empty = chunk_bounds(0, 4);
        assert_eq!(
            empty,
            [ChunkBounds {
                index: 0,
                offset: 0,
                len: 0
            }]
        );
    }
}
