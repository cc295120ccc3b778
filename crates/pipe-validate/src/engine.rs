//! Valid/invalid partitioning.
//!
//! Every rule is evaluated against every row inside the deferred plan. A row
//! failing one or more rules goes to the invalid partition with an
//! `error_reason` listing every failed rule name (joined by `"; "` in rule
//! name order). Rows passing all rules go to the valid partition unchanged.
//! Nothing executes until the partitions are materialized.

use pipe_model::{ERROR_REASON_COL, Result};
use polars::prelude::{
    DataType, Expr, LazyFrame, NULL, PolarsResult, all_horizontal, col, cols, concat_str, lit,
    when,
};
use tracing::debug;

use crate::rules::{Rule, RuleSet};

/// Temporary per-row flag; dropped from both partitions.
const VALID_FLAG_COL: &str = "__pipe_row_valid";

/// Separator between failed rule names in `error_reason`.
pub const REASON_SEPARATOR: &str = "; ";

/// Valid and invalid partitions of one plan.
///
/// The invalid partition is terminal: it carries `error_reason` and is never
/// fed through the transformation stages.
#[derive(Clone)]
pub struct ValidationOutcome {
    pub valid: LazyFrame,
    pub invalid: LazyFrame,
}

/// Split `lf` into valid and invalid partitions according to `rules`.
///
/// With no rules every row is valid and the invalid partition is an empty
/// plan with the input schema plus `error_reason`.
pub fn validate(lf: LazyFrame, rules: &RuleSet) -> Result<ValidationOutcome> {
    if rules.is_empty() {
        debug!("No validation rules provided");
        let invalid = lf
            .clone()
            .filter(lit(false))
            .with_column(lit(NULL).cast(DataType::String).alias(ERROR_REASON_COL));
        return Ok(ValidationOutcome { valid: lf, invalid });
    }

    let passes = rules
        .iter()
        .map(Rule::passes)
        .collect::<PolarsResult<Vec<_>>>()?;
    let reason_parts: Vec<Expr> = rules
        .iter()
        .zip(passes.iter())
        .map(|(rule, pass)| {
            when(pass.clone().not())
                .then(lit(rule.name().to_string()))
                .otherwise(lit(NULL).cast(DataType::String))
        })
        .collect();

    let flag = all_horizontal(passes)?.alias(VALID_FLAG_COL);
    let reason = concat_str(reason_parts, REASON_SEPARATOR, true).alias(ERROR_REASON_COL);
    let flagged = lf.with_columns([flag, reason]);

    let valid = flagged
        .clone()
        .filter(col(VALID_FLAG_COL))
        .drop(cols([VALID_FLAG_COL, ERROR_REASON_COL]));
    let invalid = flagged
        .filter(col(VALID_FLAG_COL).not())
        .drop(cols([VALID_FLAG_COL]));

    debug!(rules = rules.len(), "Validation rules applied");
    Ok(ValidationOutcome { valid, invalid })
}
