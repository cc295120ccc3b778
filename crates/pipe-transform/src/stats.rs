//! Descriptive statistics.
//!
//! `describe` produces a deferred frame with a `statistic` column followed by
//! one `String` column per non-system data column. Statistics that do not
//! apply to a column's type are null.

use std::fmt;

use pipe_model::{Result, is_system_column};
use polars::prelude::{
    DataType, Expr, LazyFrame, NULL, UnionArgs, col, concat, len, lit,
};
use tracing::debug;

/// Name of the leading column holding the statistic label.
pub const STATISTIC_COL: &str = "statistic";

/// Rows of a statistics frame, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statistic {
    Count,
    NullCount,
    Mean,
    Std,
    Min,
    Max,
    Median,
    NullProportion,
    NUnique,
}

impl Statistic {
    pub const ALL: [Self; 9] = [
        Self::Count,
        Self::NullCount,
        Self::Mean,
        Self::Std,
        Self::Min,
        Self::Max,
        Self::Median,
        Self::NullProportion,
        Self::NUnique,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::NullCount => "null_count",
            Self::Mean => "mean",
            Self::Std => "std",
            Self::Min => "min",
            Self::Max => "max",
            Self::Median => "median",
            Self::NullProportion => "null_proportion",
            Self::NUnique => "n_unique",
        }
    }

    fn applies_to(self, dtype: &DataType) -> bool {
        match self {
            Self::Count | Self::NullCount | Self::NullProportion => true,
            Self::Mean | Self::Std => dtype.is_primitive_numeric() || dtype.is_bool(),
            Self::Median => dtype.is_primitive_numeric(),
            Self::Min | Self::Max => {
                dtype.is_primitive_numeric() || dtype.is_temporal() || dtype.is_string()
            }
            Self::NUnique => !dtype.is_nested(),
        }
    }

    fn expr(self, name: &str, dtype: &DataType) -> Expr {
        if !self.applies_to(dtype) {
            return lit(NULL).cast(DataType::String);
        }
        let column = col(name);
        let value = match self {
            Self::Count => column.count(),
            Self::NullCount => column.null_count(),
            Self::Mean => column.mean(),
            Self::Std => column.cast(DataType::Float64).std(1),
            Self::Min => column.min(),
            Self::Max => column.max(),
            Self::Median => column.median(),
            Self::NullProportion => {
                column.null_count().cast(DataType::Float64) / len().cast(DataType::Float64)
            }
            Self::NUnique => column.n_unique(),
        };
        value.cast(DataType::String)
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deferred statistics frame over every non-system column of `lf`.
pub fn describe(mut lf: LazyFrame) -> Result<LazyFrame> {
    let schema = lf.collect_schema()?;
    let columns: Vec<(String, DataType)> = schema
        .iter()
        .filter(|(name, _)| !is_system_column(name))
        .map(|(name, dtype)| (name.to_string(), dtype.clone()))
        .collect();
    debug!(columns = columns.len(), "Describing frame");

    let rows: Vec<LazyFrame> = Statistic::ALL
        .iter()
        .map(|stat| {
            let mut exprs = Vec::with_capacity(columns.len() + 1);
            exprs.push(lit(stat.as_str()).alias(STATISTIC_COL));
            exprs.extend(
                columns
                    .iter()
                    .map(|(name, dtype)| stat.expr(name, dtype).alias(name.as_str())),
            );
            lf.clone().select(exprs)
        })
        .collect();

    Ok(concat(rows, UnionArgs::default())?)
}
