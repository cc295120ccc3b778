//! Shared model for the batch transformation pipeline.
//!
//! - **config**: typed run and per-stage configuration (absent stage = identity)
//! - **columns**: system column naming conventions
//! - **context**: per-run identity (guid, timestamp, process name)
//! - **dtype**: recast target type names
//! - **error**: schema / configuration / pipeline error taxonomy

pub mod columns;
pub mod config;
pub mod context;
pub mod dtype;
pub mod error;

pub use columns::{
    ERROR_REASON_COL, ROW_HASH_COL, SYS_COL_PREFIX, is_system_column, process_datetime_col,
    process_guid_col,
};
pub use config::{
    ClipBounds, CustomTransformSpec, DEFAULT_CHUNK_BUDGET_BYTES, DedupColumns, DeriveSpec,
    FileType, Kwargs, RuleConfig, RunConfig, TransformConfig,
};
pub use context::RunContext;
pub use dtype::DTypeName;
pub use error::{ConfigError, PipelineError, Result, SchemaError};
