//! Rule parsing.
//!
//! A rule spec is `[columns, op]` or `[columns, op, value]`:
//!
//! - `columns`: one column name or an array of names; the predicate must
//!   hold for every named column
//! - `op`: one of [`RuleOp::NAMES`] (symbolic aliases such as `>=` accepted)
//! - `value`: scalar for comparisons, array for `is_in`, `[lo, hi]` for
//!   `is_between`, regular expression for `matches`
//!
//! Parsing is eager: a malformed rule is a [`ConfigError`] before any data
//! is touched.

use std::collections::BTreeSet;
use std::fmt;

use pipe_model::{ConfigError, RuleConfig};
use polars::prelude::{DataType, Expr, PolarsResult, all_horizontal, col, lit};
use serde_json::Value;

use crate::literal::{json_kind, json_literal};

/// Built-in predicate operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleOp {
    IsNull,
    IsNotNull,
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    IsIn,
    IsBetween,
    Matches,
}

impl RuleOp {
    /// Canonical operation names.
    pub const NAMES: [&'static str; 11] = [
        "is_null",
        "is_not_null",
        "eq",
        "ne",
        "gt",
        "ge",
        "lt",
        "le",
        "is_in",
        "is_between",
        "matches",
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        let op = match name.trim().to_ascii_lowercase().as_str() {
            "is_null" => Self::IsNull,
            "is_not_null" | "not_null" => Self::IsNotNull,
            "eq" | "==" => Self::Eq,
            "ne" | "neq" | "!=" => Self::Ne,
            "gt" | ">" => Self::Gt,
            "ge" | "gt_eq" | ">=" => Self::Ge,
            "lt" | "<" => Self::Lt,
            "le" | "lt_eq" | "<=" => Self::Le,
            "is_in" | "in" => Self::IsIn,
            "is_between" | "between" => Self::IsBetween,
            "matches" | "regex" => Self::Matches,
            _ => return None,
        };
        Some(op)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::IsNull => "is_null",
            Self::IsNotNull => "is_not_null",
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Gt => "gt",
            Self::Ge => "ge",
            Self::Lt => "lt",
            Self::Le => "le",
            Self::IsIn => "is_in",
            Self::IsBetween => "is_between",
            Self::Matches => "matches",
        }
    }

    fn takes_value(self) -> bool {
        !matches!(self, Self::IsNull | Self::IsNotNull)
    }
}

impl fmt::Display for RuleOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy)]
enum Comparison {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

/// A parsed built-in check; each variant carries exactly the operand its
/// operation needs.
#[derive(Debug, Clone)]
enum Builtin {
    IsNull,
    IsNotNull,
    Compare(Comparison, Expr),
    IsIn(Vec<Expr>),
    IsBetween(Expr, Expr),
    Matches(String),
}

#[derive(Debug, Clone)]
enum Check {
    Builtin(Builtin),
    Custom(Expr),
}

/// A named row predicate over one or more columns.
#[derive(Debug, Clone)]
pub struct Rule {
    name: String,
    columns: Vec<String>,
    check: Check,
}

impl Rule {
    /// Parse a rule from its configuration spec.
    pub fn parse(name: &str, spec: &[Value]) -> Result<Self, ConfigError> {
        let (columns_spec, op_spec, value) = match spec {
            [c, o] => (c, o, None),
            [c, o, v] => (c, o, Some(v)),
            _ => {
                return Err(ConfigError::invalid_rule(
                    name,
                    format!(
                        "expected [columns, op] or [columns, op, value], got {} elements",
                        spec.len()
                    ),
                ));
            }
        };

        let columns = parse_columns(name, columns_spec)?;
        let op_name = op_spec
            .as_str()
            .ok_or_else(|| ConfigError::invalid_rule(name, "operation must be a string"))?;
        let op = RuleOp::from_name(op_name).ok_or_else(|| {
            ConfigError::invalid_rule(
                name,
                format!(
                    "unknown operation '{op_name}' (expected one of: {})",
                    RuleOp::NAMES.join(", ")
                ),
            )
        })?;
        let builtin = parse_builtin(name, op, value)?;

        Ok(Self {
            name: name.to_string(),
            columns,
            check: Check::Builtin(builtin),
        })
    }

    /// A rule backed by an arbitrary boolean expression.
    ///
    /// `columns` lists the columns the expression reads, so presence can be
    /// checked before execution.
    pub fn custom(name: impl Into<String>, columns: Vec<String>, predicate: Expr) -> Self {
        Self {
            name: name.into(),
            columns,
            check: Check::Custom(predicate),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Boolean expression for this rule. May evaluate to null.
    pub fn predicate(&self) -> PolarsResult<Expr> {
        match &self.check {
            Check::Custom(expr) => Ok(expr.clone()),
            Check::Builtin(builtin) => {
                let per_column: Vec<Expr> = self
                    .columns
                    .iter()
                    .map(|c| column_check(col(c.as_str()), builtin))
                    .collect();
                match per_column.as_slice() {
                    [single] => Ok(single.clone()),
                    _ => all_horizontal(per_column),
                }
            }
        }
    }

    /// Predicate with null outcomes counted as failures.
    pub fn passes(&self) -> PolarsResult<Expr> {
        Ok(self.predicate()?.fill_null(lit(false)))
    }
}

fn parse_columns(rule: &str, spec: &Value) -> Result<Vec<String>, ConfigError> {
    let columns = match spec {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    ConfigError::invalid_rule(
                        rule,
                        format!("column names must be strings, got {}", json_kind(item)),
                    )
                })
            })
            .collect::<Result<Vec<_>, _>>()?,
        other => {
            return Err(ConfigError::invalid_rule(
                rule,
                format!(
                    "columns must be a name or an array of names, got {}",
                    json_kind(other)
                ),
            ));
        }
    };
    if columns.is_empty() || columns.iter().any(String::is_empty) {
        return Err(ConfigError::invalid_rule(
            rule,
            "at least one non-empty column name is required",
        ));
    }
    Ok(columns)
}

fn parse_builtin(rule: &str, op: RuleOp, value: Option<&Value>) -> Result<Builtin, ConfigError> {
    if !op.takes_value() && value.is_some() {
        return Err(ConfigError::invalid_rule(
            rule,
            format!("operation '{op}' takes no value"),
        ));
    }
    let required = || {
        value.ok_or_else(|| {
            ConfigError::invalid_rule(rule, format!("operation '{op}' requires a value"))
        })
    };
    let scalar = |v: &Value| {
        json_literal(v).ok_or_else(|| {
            ConfigError::invalid_rule(
                rule,
                format!("operation '{op}' expects a scalar, got {}", json_kind(v)),
            )
        })
    };
    let compare = |comparison: Comparison| -> Result<Builtin, ConfigError> {
        let value = required()?;
        if value.is_null() {
            return Err(ConfigError::invalid_rule(
                rule,
                format!("operation '{op}' cannot compare against null; use is_null"),
            ));
        }
        Ok(Builtin::Compare(comparison, scalar(value)?))
    };

    match op {
        RuleOp::IsNull => Ok(Builtin::IsNull),
        RuleOp::IsNotNull => Ok(Builtin::IsNotNull),
        RuleOp::Eq => compare(Comparison::Eq),
        RuleOp::Ne => compare(Comparison::Ne),
        RuleOp::Gt => compare(Comparison::Gt),
        RuleOp::Ge => compare(Comparison::Ge),
        RuleOp::Lt => compare(Comparison::Lt),
        RuleOp::Le => compare(Comparison::Le),
        RuleOp::IsIn => {
            let items = required()?.as_array().ok_or_else(|| {
                ConfigError::invalid_rule(rule, "is_in expects an array of values")
            })?;
            let literals = items.iter().map(&scalar).collect::<Result<Vec<_>, _>>()?;
            Ok(Builtin::IsIn(literals))
        }
        RuleOp::IsBetween => match required()?.as_array().map(Vec::as_slice) {
            Some([lo, hi]) => Ok(Builtin::IsBetween(scalar(lo)?, scalar(hi)?)),
            _ => Err(ConfigError::invalid_rule(
                rule,
                "is_between expects [lower, upper]",
            )),
        },
        RuleOp::Matches => {
            let pattern = required()?.as_str().ok_or_else(|| {
                ConfigError::invalid_rule(rule, "matches expects a regular expression string")
            })?;
            regex::Regex::new(pattern).map_err(|e| {
                ConfigError::invalid_rule(rule, format!("invalid regular expression: {e}"))
            })?;
            Ok(Builtin::Matches(pattern.to_string()))
        }
    }
}

fn column_check(column: Expr, builtin: &Builtin) -> Expr {
    match builtin {
        Builtin::IsNull => column.is_null(),
        Builtin::IsNotNull => column.is_not_null(),
        Builtin::Compare(comparison, v) => {
            let v = v.clone();
            match comparison {
                Comparison::Eq => column.eq(v),
                Comparison::Ne => column.neq(v),
                Comparison::Gt => column.gt(v),
                Comparison::Ge => column.gt_eq(v),
                Comparison::Lt => column.lt(v),
                Comparison::Le => column.lt_eq(v),
            }
        }
        Builtin::IsIn(values) => values
            .iter()
            .map(|v| column.clone().eq(v.clone()).fill_null(lit(false)))
            .reduce(Expr::or)
            .unwrap_or_else(|| lit(false)),
        Builtin::IsBetween(lo, hi) => column
            .clone()
            .gt_eq(lo.clone())
            .fill_null(lit(false))
            .and(column.lt_eq(hi.clone()).fill_null(lit(false))),
        Builtin::Matches(pattern) => column
            .cast(DataType::String)
            .str()
            .contains(lit(pattern.clone()), true),
    }
}

/// An ordered set of uniquely named rules.
///
/// Rules are kept sorted by name so evaluation and the joined failure
/// reasons are deterministic.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse every rule in a configuration map.
    pub fn from_config(config: &RuleConfig) -> Result<Self, ConfigError> {
        let rules = config
            .iter()
            .map(|(name, spec)| Rule::parse(name, spec))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// Parse an optional configuration; absent means no rules.
    pub fn from_optional(config: Option<&RuleConfig>) -> Result<Self, ConfigError> {
        config.map_or_else(|| Ok(Self::new()), Self::from_config)
    }

    /// Add a rule, rejecting duplicate names.
    pub fn add(&mut self, rule: Rule) -> Result<(), ConfigError> {
        match self
            .rules
            .binary_search_by(|existing| existing.name().cmp(rule.name()))
        {
            Ok(_) => Err(ConfigError::invalid_rule(
                rule.name(),
                "a rule with this name already exists",
            )),
            Err(pos) => {
                self.rules.insert(pos, rule);
                Ok(())
            }
        }
    }

    pub fn with_rule(mut self, rule: Rule) -> Result<Self, ConfigError> {
        self.add(rule)?;
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    /// Every column referenced by any rule, deduplicated and sorted.
    pub fn referenced_columns(&self) -> Vec<String> {
        self.rules
            .iter()
            .flat_map(|rule| rule.columns().iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Conjunction of every rule's null-safe predicate, or `None` when empty.
    pub fn all_pass(&self) -> PolarsResult<Option<Expr>> {
        let passes = self
            .rules
            .iter()
            .map(Rule::passes)
            .collect::<PolarsResult<Vec<_>>>()?;
        match passes.as_slice() {
            [] => Ok(None),
            [single] => Ok(Some(single.clone())),
            _ => all_horizontal(passes).map(Some),
        }
    }
}
