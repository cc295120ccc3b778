//! Column transformation stages.
//!
//! Every stage has the shape `stage(plan, config) -> plan`. When `config` is
//! `None` the input plan is returned unchanged. Columns a configuration
//! references are checked against the plan schema while composing, so a
//! missing column is a [`SchemaError`](pipe_model::SchemaError) before any
//! data is read.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use pipe_model::{
    ClipBounds, ConfigError, DTypeName, DedupColumns, Result, RuleConfig, SchemaError,
    is_system_column,
};
use pipe_validate::{RuleSet, json_literal, require_columns};
use polars::prelude::{
    DataType, Expr, LazyFrame, NULL, PlSmallStr, UniqueKeepStrategy, as_struct, col, cols, lit,
};
use serde_json::Value;
use tracing::debug;

/// Trim surrounding whitespace and lowercase every non-system text column.
pub fn normalise_str_cols(mut lf: LazyFrame) -> Result<LazyFrame> {
    let schema = lf.collect_schema()?;
    let exprs: Vec<Expr> = schema
        .iter()
        .filter(|(name, dtype)| dtype.is_string() && !is_system_column(name))
        .map(|(name, _)| {
            col(name.clone())
                .str()
                .strip_chars(lit(NULL))
                .str()
                .to_lowercase()
        })
        .collect();
    debug!(columns = exprs.len(), "Normalising string columns");
    if exprs.is_empty() {
        return Ok(lf);
    }
    Ok(lf.with_columns(exprs))
}

/// Drop duplicate rows, keeping the first occurrence and row order.
pub fn deduplicate_rows(mut lf: LazyFrame, config: Option<&DedupColumns>) -> Result<LazyFrame> {
    let Some(subset) = config else {
        debug!("No deduplication provided");
        return Ok(lf);
    };
    let schema = lf.collect_schema()?;
    let keys: Vec<&str> = match subset {
        DedupColumns::All => schema
            .iter_names()
            .map(PlSmallStr::as_str)
            .filter(|name| !is_system_column(name))
            .collect(),
        DedupColumns::Subset(columns) => {
            require_columns(&schema, columns.iter().map(String::as_str))?;
            columns.iter().map(String::as_str).collect()
        }
    };
    // System columns never join the wildcard key.
    let selector = (!keys.is_empty()).then(|| cols(keys));
    debug!(subset = ?subset, "Deduplicating rows");
    Ok(lf.unique_stable(selector, UniqueKeepStrategy::First))
}

/// Expand struct columns into their fields.
pub fn unnest_df_cols(mut lf: LazyFrame, config: Option<&[String]>) -> Result<LazyFrame> {
    let Some(columns) = config else {
        debug!("No unnest columns provided");
        return Ok(lf);
    };
    if columns.is_empty() {
        return Ok(lf);
    }
    let schema = lf.collect_schema()?;
    require_columns(&schema, columns.iter().map(String::as_str))?;
    for name in columns {
        if let Some(dtype) = schema.get(name)
            && !dtype.is_struct()
        {
            return Err(ConfigError::invalid_field(
                "unnest_cols",
                format!("column '{name}' has type {dtype}, only struct columns can be unnested"),
            )
            .into());
        }
    }
    debug!(columns = ?columns, "Unnesting columns");
    Ok(lf.unnest(cols(columns.iter().map(String::as_str))))
}

/// Keep rows for which every predicate holds (null counts as false).
pub fn filter_df(mut lf: LazyFrame, config: Option<&RuleConfig>) -> Result<LazyFrame> {
    let Some(filter_exprs) = config else {
        debug!("No filter expressions provided");
        return Ok(lf);
    };
    let predicates = RuleSet::from_config(filter_exprs)?;
    let schema = lf.collect_schema()?;
    require_columns(
        &schema,
        predicates.referenced_columns().iter().map(String::as_str),
    )?;
    match predicates.all_pass()? {
        Some(predicate) => {
            debug!(predicates = predicates.len(), "Filtering rows");
            Ok(lf.filter(predicate))
        }
        None => Ok(lf),
    }
}

/// Replace nulls per column with a configured scalar.
pub fn fill_nulls_per_col(
    mut lf: LazyFrame,
    config: Option<&BTreeMap<String, Value>>,
) -> Result<LazyFrame> {
    let Some(fill_map) = config else {
        debug!("No fill map provided");
        return Ok(lf);
    };
    let schema = lf.collect_schema()?;
    require_columns(&schema, fill_map.keys().map(String::as_str))?;

    let mut exprs = Vec::with_capacity(fill_map.len());
    for (name, value) in fill_map {
        let fill = json_literal(value).ok_or_else(|| {
            ConfigError::invalid_field("fill_map", format!("fill value for '{name}' must be a scalar"))
        })?;
        let column = col(name.as_str());
        let filled = match schema.get(name) {
            Some(dtype) if widens_integer(value, dtype) => {
                column.cast(DataType::Float64).fill_null(fill)
            }
            Some(dtype) => column.fill_null(fit_literal(fill, value, dtype)),
            None => column.fill_null(fill),
        };
        exprs.push(filled);
    }
    debug!(columns = exprs.len(), "Filling nulls");
    Ok(lf.with_columns(exprs))
}

/// Cast columns to the configured types.
///
/// Casting is strict: a value that cannot be represented in the target type
/// fails the chunk when it is materialized.
pub fn recast_df_cols(
    mut lf: LazyFrame,
    config: Option<&BTreeMap<String, DTypeName>>,
) -> Result<LazyFrame> {
    let Some(recast_map) = config else {
        debug!("No recast map provided");
        return Ok(lf);
    };
    let schema = lf.collect_schema()?;
    require_columns(&schema, recast_map.keys().map(String::as_str))?;
    let exprs: Vec<Expr> = recast_map
        .iter()
        .map(|(name, dtype)| col(name.as_str()).strict_cast(dtype.to_polars()))
        .collect();
    debug!(columns = exprs.len(), "Recasting columns");
    Ok(lf.with_columns(exprs))
}

/// Clamp numeric or temporal columns to an inclusive range.
///
/// A `null` bound leaves that side open.
pub fn clip_df_cols(
    mut lf: LazyFrame,
    config: Option<&BTreeMap<String, ClipBounds>>,
) -> Result<LazyFrame> {
    let Some(clip_map) = config else {
        debug!("No clip map provided");
        return Ok(lf);
    };
    let schema = lf.collect_schema()?;
    require_columns(&schema, clip_map.keys().map(String::as_str))?;

    let mut exprs = Vec::with_capacity(clip_map.len());
    for (name, (lower, upper)) in clip_map {
        let Some(dtype) = schema.get(name) else {
            continue;
        };
        if !(dtype.is_primitive_numeric() || dtype.is_temporal()) {
            return Err(SchemaError::UnexpectedType {
                column: name.clone(),
                expected: "numeric or temporal",
                actual: dtype.to_string(),
            }
            .into());
        }
        let target = if widens_integer(lower, dtype) || widens_integer(upper, dtype) {
            DataType::Float64
        } else {
            dtype.clone()
        };
        let bound = |value: &Value| -> std::result::Result<Option<Expr>, ConfigError> {
            if value.is_null() {
                return Ok(None);
            }
            match (value, json_literal(value)) {
                (Value::Number(_) | Value::String(_), Some(expr)) => {
                    Ok(Some(fit_literal(expr, value, &target)))
                }
                _ => Err(ConfigError::invalid_field(
                    "clip_map",
                    format!("bounds for '{name}' must be numbers, strings or null"),
                )),
            }
        };
        let column = if &target == dtype {
            col(name.as_str())
        } else {
            col(name.as_str()).cast(target.clone())
        };
        let clipped = match (bound(lower)?, bound(upper)?) {
            (Some(lo), Some(hi)) => column.clip(lo, hi),
            (Some(lo), None) => column.clip_min(lo),
            (None, Some(hi)) => column.clip_max(hi),
            (None, None) => continue,
        };
        exprs.push(clipped);
    }
    debug!(columns = exprs.len(), "Clipping columns");
    if exprs.is_empty() {
        return Ok(lf);
    }
    Ok(lf.with_columns(exprs))
}

/// Rename columns one to one.
///
/// A mapping that would leave two columns with the same name is rejected.
pub fn rename_df_cols(
    mut lf: LazyFrame,
    config: Option<&BTreeMap<String, String>>,
) -> Result<LazyFrame> {
    let Some(rename_map) = config else {
        debug!("No rename map provided");
        return Ok(lf);
    };
    let schema = lf.collect_schema()?;
    require_columns(&schema, rename_map.keys().map(String::as_str))?;

    let mut seen: HashSet<&str> = HashSet::with_capacity(schema.len());
    for name in schema.iter_names() {
        let target = rename_map
            .get(name.as_str())
            .map_or(name.as_str(), String::as_str);
        if !seen.insert(target) {
            return Err(ConfigError::RenameCollision {
                reason: format!("more than one column would be named '{target}'"),
            }
            .into());
        }
    }

    debug!(columns = rename_map.len(), "Renaming columns");
    Ok(lf.rename(rename_map.keys(), rename_map.values(), true))
}

/// Pack source columns into struct columns, dropping the sources.
pub fn nest_df_cols(
    mut lf: LazyFrame,
    config: Option<&BTreeMap<String, Vec<String>>>,
) -> Result<LazyFrame> {
    let Some(nest_map) = config else {
        debug!("No nest columns provided");
        return Ok(lf);
    };
    if let Some((name, _)) = nest_map.iter().find(|(_, sources)| sources.is_empty()) {
        return Err(ConfigError::invalid_field(
            "nest_cols",
            format!("struct column '{name}' needs at least one source column"),
        )
        .into());
    }
    if nest_map.is_empty() {
        return Ok(lf);
    }
    let schema = lf.collect_schema()?;
    require_columns(&schema, nest_map.values().flatten().map(String::as_str))?;

    let structs: Vec<Expr> = nest_map
        .iter()
        .map(|(name, sources)| {
            as_struct(sources.iter().map(|s| col(s.as_str())).collect()).alias(name.as_str())
        })
        .collect();
    let consumed: BTreeSet<&str> = nest_map
        .values()
        .flatten()
        .map(String::as_str)
        .filter(|source| !nest_map.contains_key(*source))
        .collect();

    debug!(structs = structs.len(), "Nesting columns");
    let lf = lf.with_columns(structs);
    if consumed.is_empty() {
        return Ok(lf);
    }
    Ok(lf.drop(cols(consumed)))
}

/// Remove columns.
pub fn drop_df_cols(mut lf: LazyFrame, config: Option<&[String]>) -> Result<LazyFrame> {
    let Some(columns) = config else {
        debug!("No drop columns provided");
        return Ok(lf);
    };
    if columns.is_empty() {
        return Ok(lf);
    }
    let schema = lf.collect_schema()?;
    require_columns(&schema, columns.iter().map(String::as_str))?;
    debug!(columns = ?columns, "Dropping columns");
    Ok(lf.drop(cols(columns.iter().map(String::as_str))))
}

/// A fractional number against an integer column: the column is widened to
/// `Float64` rather than truncating the value.
fn widens_integer(value: &Value, dtype: &DataType) -> bool {
    match value {
        Value::Number(n) => dtype.is_integer() && n.as_i64().is_none() && n.as_u64().is_none(),
        _ => false,
    }
}

/// Cast a literal to the column's type so filling or clipping keeps the
/// column type. Callers widen integer columns first (see [`widens_integer`]).
fn fit_literal(literal: Expr, value: &Value, dtype: &DataType) -> Expr {
    match value {
        Value::Number(_) if dtype.is_primitive_numeric() => literal.strict_cast(dtype.clone()),
        Value::String(_) if dtype.is_temporal() => literal.strict_cast(dtype.clone()),
        _ => literal,
    }
}
