//! Pipeline composition and chunked execution.
//!
//! - **pipeline**: compose validation, lineage and stages into one deferred plan
//! - **chunk**: size estimation and disjoint, order-preserving chunk bounds
//! - **provenance**: the run record saved before any chunk is written
//! - **sink**: where materialized chunks go
//! - **run**: drive the chunks through the composed plan
//!
//! # Example
//!
//! ```ignore
//! use pipe_core::{MemorySink, Pipeline, run};
//!
//! let pipeline = Pipeline::new(config, ctx, registry)?;
//! let mut sink = MemorySink::default();
//! let summary = run(&pipeline, source, &mut sink, |_| {})?;
//! ```

pub mod chunk;
pub mod error;
pub mod pipeline;
pub mod provenance;
pub mod run;
pub mod sink;

pub use chunk::{ChunkBounds, ChunkPlan, SizeEstimate, chunk_bounds, chunk_count, estimate_size, plan_chunks};
pub use error::RunError;
pub use pipeline::{ComposedPlan, Pipeline};
pub use provenance::Provenance;
pub use run::{ChunkSummary, PreparedRun, RunSummary, execute, prepare, run};
pub use sink::{ChunkFrames, ChunkSink, MemorySink};
