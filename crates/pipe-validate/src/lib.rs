//! Row validation for the transformation pipeline.
//!
//! - **rules**: parse `[columns, op, value?]` rule specs into predicates
//! - **engine**: split a deferred plan into valid and invalid partitions
//! - **schema**: composition-time column presence checks
//! - **literal**: configuration values as engine literals

pub mod engine;
pub mod literal;
pub mod rules;
pub mod schema;

pub use engine::{ValidationOutcome, validate};
pub use literal::json_literal;
pub use rules::{Rule, RuleOp, RuleSet};
pub use schema::{check_expected_cols, column_names, require_columns};
