//! Error taxonomy for pipeline composition and execution.
//!
//! Structural problems (`SchemaError`, `ConfigError`) are raised while the
//! plan is being composed, before any data is materialized. Per-row
//! validation failures are data and never appear here.

use std::path::PathBuf;

use polars::prelude::PolarsError;
use thiserror::Error;

/// The input schema does not satisfy what the configuration references.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// One or more referenced columns are absent from the plan schema.
    #[error("missing required columns {missing:?} (available: {available:?})")]
    MissingColumns {
        missing: Vec<String>,
        available: Vec<String>,
    },

    /// A column exists but its type does not fit the stage.
    #[error("column '{column}' has type {actual}, expected {expected}")]
    UnexpectedType {
        column: String,
        expected: &'static str,
        actual: String,
    },
}

/// Malformed or inconsistent configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file did not deserialize.
    #[error("failed to parse config {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// The configuration file extension is not a supported format.
    #[error("unsupported config format for {path} (expected .json or .toml)")]
    UnsupportedFormat { path: PathBuf },

    /// A validation or filter rule could not be parsed.
    #[error("invalid rule '{rule}': {reason}")]
    InvalidRule { rule: String, reason: String },

    /// `new_col_map` names a function absent from the derive registry.
    #[error("unknown derive function '{name}' for column '{column}' (registered: {registered})")]
    UnknownDeriveFn {
        column: String,
        name: String,
        registered: String,
    },

    /// Derive function arguments are missing or ill-typed.
    #[error("invalid arguments for derive function '{name}': {reason}")]
    InvalidDeriveArgs { name: String, reason: String },

    /// Custom transformation named in config but not supplied by the caller.
    #[error("unknown custom transformation '{name}' (registered: {registered})")]
    UnknownCustomTransform { name: String, registered: String },

    /// Renaming would produce duplicate column names.
    #[error("rename collision: {reason}")]
    RenameCollision { reason: String },

    /// Any other invalid field value.
    #[error("invalid value for {field}: {reason}")]
    InvalidField { field: String, reason: String },
}

/// Errors surfaced by composing or materializing a pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A caller-supplied custom transformation returned an error.
    #[error("custom transformation '{name}' failed: {message}")]
    CustomTransform { name: String, message: String },

    /// Engine failure, including strict cast failures at materialization.
    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

impl ConfigError {
    pub fn invalid_rule(rule: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRule {
            rule: rule.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SchemaError::MissingColumns {
            missing: vec!["c".to_string()],
            available: vec!["a".to_string(), "b".to_string()],
        };
        insta::assert_snapshot!(err.to_string(), @r#"missing required columns ["c"] (available: ["a", "b"])"#);
    }

    #[test]
    fn test_error_from_polars() {
        let polars_err = PolarsError::ColumnNotFound("test".into());
        let err: PipelineError = polars_err.into();
        assert!(matches!(err, PipelineError::Polars(_)));
    }

    #[test]
    fn test_config_error_is_transparent() {
        let err: PipelineError = ConfigError::invalid_rule("positive", "unknown operation").into();
        assert_eq!(
            err.to_string(),
            "invalid rule 'positive': unknown operation"
        );
    }
}
