//! Transformation stages for the batch pipeline.
//!
//! Each stage takes a deferred plan plus optional configuration and returns a
//! new plan. Absent configuration is an identity pass-through.
//!
//! - **lineage**: row hash and per-process lineage columns
//! - **stages**: normalise, dedup, unnest, filter, fill, recast, clip,
//!   rename, nest, drop
//! - **derive**: closed registry of column derivation functions
//! - **custom**: caller-supplied named transformations
//! - **stats**: descriptive statistics frames

pub mod custom;
pub mod derive;
pub mod lineage;
pub mod stages;
pub mod stats;

pub use custom::{CustomTransform, CustomTransformRegistry, pipe_custom_transformations};
pub use derive::{DeriveFn, DerivedColumn, derive_new_cols};
pub use lineage::{add_hash_col, add_process_cols};
pub use stages::{
    clip_df_cols, deduplicate_rows, drop_df_cols, fill_nulls_per_col, filter_df, nest_df_cols,
    normalise_str_cols, recast_df_cols, rename_df_cols, unnest_df_cols,
};
pub use stats::{STATISTIC_COL, Statistic, describe};
