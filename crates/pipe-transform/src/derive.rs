//! Derived column registry.
//!
//! A closed set of derivation functions addressed by name from
//! `new_col_map`:
//!
//! - combinators over `{"cols": [..]}`: `add_cols`, `sub_cols`, `mul_cols`,
//!   `div_cols` (reduced left to right)
//! - single-column methods over `{"col": ..}`: `cum_sum`, `cum_prod`,
//!   `cum_min`, `cum_max` (optional `"reverse": bool`), `abs`

use std::collections::BTreeMap;
use std::fmt;

use pipe_model::{ConfigError, DeriveSpec, Kwargs, Result};
use pipe_validate::require_columns;
use polars::prelude::{Expr, LazyFrame, col};
use serde_json::Value;
use tracing::{debug, info_span};

/// Registered derivation functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeriveFn {
    AddCols,
    SubCols,
    MulCols,
    DivCols,
    CumSum,
    CumProd,
    CumMin,
    CumMax,
    Abs,
}

/// An expression ready to be aliased, with the columns it reads.
#[derive(Debug, Clone)]
pub struct DerivedColumn {
    pub expr: Expr,
    pub inputs: Vec<String>,
}

impl DeriveFn {
    pub const ALL: [Self; 9] = [
        Self::AddCols,
        Self::SubCols,
        Self::MulCols,
        Self::DivCols,
        Self::CumSum,
        Self::CumProd,
        Self::CumMin,
        Self::CumMax,
        Self::Abs,
    ];

    /// Exact-match lookup.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    /// Lookup reporting the registered names on failure.
    pub fn lookup(name: &str, column: &str) -> std::result::Result<Self, ConfigError> {
        Self::from_name(name).ok_or_else(|| ConfigError::UnknownDeriveFn {
            column: column.to_string(),
            name: name.to_string(),
            registered: Self::registered_names(),
        })
    }

    pub fn registered_names() -> String {
        Self::ALL
            .iter()
            .map(|f| f.name())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::AddCols => "add_cols",
            Self::SubCols => "sub_cols",
            Self::MulCols => "mul_cols",
            Self::DivCols => "div_cols",
            Self::CumSum => "cum_sum",
            Self::CumProd => "cum_prod",
            Self::CumMin => "cum_min",
            Self::CumMax => "cum_max",
            Self::Abs => "abs",
        }
    }

    /// Accepted keyword arguments, for listings.
    pub fn signature(self) -> &'static str {
        match self {
            Self::AddCols | Self::SubCols | Self::MulCols | Self::DivCols => "cols: [column, ..]",
            Self::CumSum | Self::CumProd | Self::CumMin | Self::CumMax => {
                "col: column, reverse: bool = false"
            }
            Self::Abs => "col: column",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::AddCols => "Elementwise sum across columns",
            Self::SubCols => "Elementwise difference, first column minus the rest",
            Self::MulCols => "Elementwise product across columns",
            Self::DivCols => "Elementwise quotient, first column divided by the rest",
            Self::CumSum => "Cumulative sum of one column",
            Self::CumProd => "Cumulative product of one column",
            Self::CumMin => "Cumulative minimum of one column",
            Self::CumMax => "Cumulative maximum of one column",
            Self::Abs => "Absolute value of one column",
        }
    }

    /// Build the derivation expression from its keyword arguments.
    pub fn build(self, kwargs: &Kwargs) -> std::result::Result<DerivedColumn, ConfigError> {
        match self {
            Self::AddCols | Self::SubCols | Self::MulCols | Self::DivCols => {
                let inputs = self.column_list(kwargs)?;
                let expr = inputs
                    .iter()
                    .map(|name| col(name.as_str()))
                    .reduce(|acc, next| match self {
                        Self::AddCols => acc + next,
                        Self::SubCols => acc - next,
                        Self::MulCols => acc * next,
                        _ => acc / next,
                    })
                    .ok_or_else(|| self.invalid_args("'cols' must not be empty"))?;
                Ok(DerivedColumn { expr, inputs })
            }
            Self::CumSum | Self::CumProd | Self::CumMin | Self::CumMax | Self::Abs => {
                let input = self.single_column(kwargs)?;
                let reverse = self.reverse_flag(kwargs)?;
                let base = col(input.as_str());
                let expr = match self {
                    Self::CumSum => base.cum_sum(reverse),
                    Self::CumProd => base.cum_prod(reverse),
                    Self::CumMin => base.cum_min(reverse),
                    Self::CumMax => base.cum_max(reverse),
                    _ => base.abs(),
                };
                Ok(DerivedColumn {
                    expr,
                    inputs: vec![input],
                })
            }
        }
    }

    fn column_list(self, kwargs: &Kwargs) -> std::result::Result<Vec<String>, ConfigError> {
        self.check_keys(kwargs, &["cols"])?;
        let items = kwargs
            .get("cols")
            .and_then(Value::as_array)
            .ok_or_else(|| self.invalid_args("expected 'cols' as an array of column names"))?;
        let names = items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| self.invalid_args("'cols' entries must be strings"))?;
        if names.is_empty() {
            return Err(self.invalid_args("'cols' must not be empty"));
        }
        Ok(names)
    }

    fn single_column(self, kwargs: &Kwargs) -> std::result::Result<String, ConfigError> {
        let allowed: &[&str] = if self == Self::Abs {
            &["col"]
        } else {
            &["col", "reverse"]
        };
        self.check_keys(kwargs, allowed)?;
        kwargs
            .get("col")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| self.invalid_args("expected 'col' as a column name"))
    }

    fn reverse_flag(self, kwargs: &Kwargs) -> std::result::Result<bool, ConfigError> {
        match kwargs.get("reverse") {
            None => Ok(false),
            Some(Value::Bool(b)) => Ok(*b),
            Some(_) => Err(self.invalid_args("'reverse' must be a boolean")),
        }
    }

    fn check_keys(self, kwargs: &Kwargs, allowed: &[&str]) -> std::result::Result<(), ConfigError> {
        match kwargs.keys().find(|k| !allowed.contains(&k.as_str())) {
            Some(unknown) => Err(self.invalid_args(format!("unexpected argument '{unknown}'"))),
            None => Ok(()),
        }
    }

    fn invalid_args(self, reason: impl Into<String>) -> ConfigError {
        ConfigError::InvalidDeriveArgs {
            name: self.name().to_string(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for DeriveFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Add one column per `new_col_map` entry, in name order.
///
/// Every function name and argument set is resolved before the plan is
/// extended, so an unknown `fn_name` fails without touching data. Later
/// entries may read columns derived by earlier ones.
pub fn derive_new_cols(
    mut lf: LazyFrame,
    config: Option<&BTreeMap<String, DeriveSpec>>,
) -> Result<LazyFrame> {
    let Some(new_col_map) = config else {
        debug!("No new column map provided");
        return Ok(lf);
    };
    let span = info_span!("derive_new_cols", columns = new_col_map.len());
    let _guard = span.enter();

    let resolved = new_col_map
        .iter()
        .map(|(name, spec)| -> std::result::Result<_, ConfigError> {
            let derive_fn = DeriveFn::lookup(&spec.fn_name, name)?;
            Ok((name, derive_fn, derive_fn.build(&spec.fn_kwargs)?))
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    for (name, derive_fn, derived) in resolved {
        let schema = lf.collect_schema()?;
        require_columns(&schema, derived.inputs.iter().map(String::as_str))?;
        debug!(column = %name, function = %derive_fn, "Deriving column");
        lf = lf.with_column(derived.expr.alias(name.as_str()));
    }
    Ok(lf)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn kwargs(value: Value) -> Kwargs {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn every_registered_name_round_trips() {
        for f in DeriveFn::ALL {
            assert_eq!(DeriveFn::from_name(f.name()), Some(f));
        }
        assert_eq!(DeriveFn::from_name("ADD_COLS"), None);
    }

    #[test]
    fn unknown_name_lists_registry() {
        let err = DeriveFn::lookup("sum_cols", "total").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownDeriveFn { .. }));
        insta::assert_snapshot!(
            err.to_string(),
            @"unknown derive function 'sum_cols' for column 'total' (registered: add_cols, sub_cols, mul_cols, div_cols, cum_sum, cum_prod, cum_min, cum_max, abs)"
        );
    }

    #[test]
    fn combinator_records_inputs() {
        let derived = DeriveFn::AddCols
            .build(&kwargs(json!({ "cols": ["a", "b", "c"] })))
            .unwrap();
        assert_eq!(derived.inputs, ["a", "b", "c"]);
    }

    #[test]
    fn bad_arguments_are_rejected() {
        let cases = [
            (DeriveFn::AddCols, json!({})),
            (DeriveFn::AddCols, json!({ "cols": [] })),
            (DeriveFn::AddCols, json!({ "cols": [1] })),
            (DeriveFn::CumSum, json!({ "col": "a", "reverse": "yes" })),
            (DeriveFn::Abs, json!({ "col": "a", "reverse": true })),
            (DeriveFn::CumMax, json!({ "column": "a" })),
        ];
        for (f, args) in cases {
            assert!(
                matches!(
                    f.build(&kwargs(args.clone())),
                    Err(ConfigError::InvalidDeriveArgs { .. })
                ),
                "expected rejection of {args} for {f}"
            );
        }
    }
}
