//! Configuration values as engine literals.

use polars::prelude::{Expr, NULL, lit};
use serde_json::Value;

/// Convert a scalar configuration value into a literal expression.
///
/// Returns `None` for arrays and objects, which have no scalar literal form.
pub fn json_literal(value: &Value) -> Option<Expr> {
    match value {
        Value::Null => Some(lit(NULL)),
        Value::Bool(b) => Some(lit(*b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(lit(i))
            } else if let Some(u) = n.as_u64() {
                Some(lit(u))
            } else {
                n.as_f64().map(lit)
            }
        }
        Value::String(s) => Some(lit(s.clone())),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Short type description used in error messages.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn scalars_convert_and_containers_do_not() {
        assert!(json_literal(&json!(1)).is_some());
        assert!(json_literal(&json!(1.5)).is_some());
        assert!(json_literal(&json!("x")).is_some());
        assert!(json_literal(&json!(null)).is_some());
        assert!(json_literal(&json!([1, 2])).is_none());
        assert!(json_literal(&json!({"a": 1})).is_none());
        assert_eq!(json_kind(&json!([1])), "array");
    }
}
