//! Composition-time column presence checks.
//!
//! The plan schema is resolved without executing anything, so missing
//! columns are reported before any chunk is materialized.

use pipe_model::{Result, SchemaError};
use polars::prelude::{LazyFrame, Schema};
use tracing::debug;

use crate::rules::RuleSet;

/// Column names of a deferred plan, in schema order.
pub fn column_names(lf: &mut LazyFrame) -> Result<Vec<String>> {
    let schema = lf.collect_schema()?;
    Ok(schema.iter_names().map(|name| name.to_string()).collect())
}

/// Fail with [`SchemaError::MissingColumns`] if any required column is absent.
pub fn require_columns<'a, I>(schema: &Schema, required: I) -> std::result::Result<(), SchemaError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut missing: Vec<String> = Vec::new();
    for name in required {
        if !schema.contains(name) && !missing.iter().any(|m| m == name) {
            missing.push(name.to_string());
        }
    }
    if missing.is_empty() {
        return Ok(());
    }
    Err(SchemaError::MissingColumns {
        missing,
        available: schema.iter_names().map(|name| name.to_string()).collect(),
    })
}

/// Check declared expected columns and every rule column against the plan.
///
/// A no-op when nothing is declared.
pub fn check_expected_cols(
    lf: &mut LazyFrame,
    expected: Option<&[String]>,
    rules: &RuleSet,
) -> Result<()> {
    let rule_columns = rules.referenced_columns();
    if expected.is_none() && rule_columns.is_empty() {
        debug!("No expected columns provided");
        return Ok(());
    }
    let schema = lf.collect_schema()?;
    let required = expected
        .into_iter()
        .flatten()
        .chain(rule_columns.iter())
        .map(String::as_str);
    require_columns(&schema, required)?;
    debug!(
        expected = expected.map_or(0, <[String]>::len),
        rule_columns = rule_columns.len(),
        "Expected columns present"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use polars::prelude::{DataType, Field};

    use super::*;

    fn schema(names: &[&str]) -> Schema {
        Schema::from_iter(
            names
                .iter()
                .map(|n| Field::new((*n).into(), DataType::Int64)),
        )
    }

    #[test]
    fn reports_every_missing_column_once() {
        let schema = schema(&["a", "b"]);
        let err = require_columns(&schema, ["a", "c", "d", "c"]).unwrap_err();
        let SchemaError::MissingColumns { missing, available } = err else {
            panic!("unexpected error variant");
        };
        assert_eq!(missing, ["c", "d"]);
        assert_eq!(available, ["a", "b"]);
    }

    #[test]
    fn present_columns_pass() {
        let schema = schema(&["a", "b"]);
        require_columns(&schema, ["b", "a"]).unwrap();
        require_columns(&schema, std::iter::empty()).unwrap();
    }
}
