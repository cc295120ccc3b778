//! Lineage stamping.
//!
//! - `sys_col_row_hash`: deterministic hash of every non-system column
//! - `sys_col_{process}_guid` / `sys_col_{process}_datetime`: run identity

use pipe_model::{
    ROW_HASH_COL, Result, RunContext, is_system_column, process_datetime_col, process_guid_col,
};
use polars::prelude::{
    DataType, Expr, LazyFrame, TimeUnit, as_struct, col, concat_str, lit, when,
};
use tracing::debug;

/// Fixed seeds so the hash is stable across runs and processes.
const HASH_SEEDS: [u64; 4] = [
    0x5eed_0000_0000_0001,
    0x5eed_0000_0000_0002,
    0x5eed_0000_0000_0003,
    0x5eed_0000_0000_0004,
];

/// Encoding of a null field. Present values always start with `v`.
const NULL_FIELD: &str = "~";

/// Add `sys_col_row_hash` unless it is already present.
///
/// Columns are hashed in name order, so the hash does not depend on column
/// position. System columns never participate.
pub fn add_hash_col(mut lf: LazyFrame) -> Result<LazyFrame> {
    let schema = lf.collect_schema()?;
    if schema.contains(ROW_HASH_COL) {
        debug!("Row hash column already present");
        return Ok(lf);
    }

    let mut data_columns: Vec<(String, DataType)> = schema
        .iter()
        .filter(|(name, _)| !is_system_column(name))
        .map(|(name, dtype)| (name.to_string(), dtype.clone()))
        .collect();
    data_columns.sort_by(|a, b| a.0.cmp(&b.0));

    let parts: Vec<Expr> = data_columns
        .iter()
        .map(|(name, dtype)| hashable(name, dtype))
        .collect();
    let joined = if parts.is_empty() {
        lit("")
    } else {
        concat_str(parts, "", false)
    };
    let [k0, k1, k2, k3] = HASH_SEEDS;

    debug!(columns = data_columns.len(), "Adding row hash column");
    Ok(lf.with_column(joined.hash(k0, k1, k2, k3).alias(ROW_HASH_COL)))
}

/// Self-delimiting encoding of one field: `~` for null, otherwise
/// `v<byte length>:<text>`, so no two rows share a concatenation.
fn hashable(name: &str, dtype: &DataType) -> Expr {
    let rendered = if dtype.is_struct() {
        col(name).struct_().json_encode()
    } else if dtype.is_nested() {
        as_struct(vec![col(name)]).struct_().json_encode()
    } else {
        col(name).cast(DataType::String)
    };
    let encoded = concat_str(
        [
            lit("v"),
            rendered.clone().str().len_bytes().cast(DataType::String),
            lit(":"),
            rendered.clone(),
        ],
        "",
        false,
    );
    when(rendered.is_null())
        .then(lit(NULL_FIELD))
        .otherwise(encoded)
}

/// Stamp the run guid and timestamp under names keyed by the process.
///
/// Lineage columns of other processes are left untouched; columns of the
/// current process are overwritten.
pub fn add_process_cols(lf: LazyFrame, ctx: &RunContext) -> LazyFrame {
    let guid_col = process_guid_col(&ctx.process_name);
    let datetime_col = process_datetime_col(&ctx.process_name);
    debug!(
        guid_col = %guid_col,
        datetime_col = %datetime_col,
        guid = %ctx.guid,
        "Adding process columns"
    );
    lf.with_columns([
        lit(ctx.guid.clone()).alias(guid_col),
        lit(ctx.naive_timestamp())
            .cast(DataType::Datetime(TimeUnit::Microseconds, None))
            .alias(datetime_col),
    ])
}
