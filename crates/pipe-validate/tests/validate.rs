//! Tests for rule evaluation and valid/invalid partitioning.

use pipe_model::{ERROR_REASON_COL, PipelineError, RuleConfig, SchemaError};
use pipe_validate::{Rule, RuleSet, check_expected_cols, validate};
use polars::prelude::*;
use proptest::prelude::*;
use serde_json::{Value, json};

fn rules(config: Value) -> RuleSet {
    let config: RuleConfig = serde_json::from_value(config).unwrap();
    RuleSet::from_config(&config).unwrap()
}

fn test_df() -> DataFrame {
    df! {
        "a" => [Some(1i64), None],
        "b" => [2i64, 3],
    }
    .unwrap()
}

#[test]
fn test_not_null_rule_partitions_rows() {
    let rules = rules(json!({ "a not null": ["a", "is_not_null"] }));
    let outcome = validate(test_df().lazy(), &rules).unwrap();

    let valid = outcome.valid.collect().unwrap();
    let invalid = outcome.invalid.collect().unwrap();

    assert_eq!(valid.get_column_names_str(), ["a", "b"]);
    assert_eq!(valid.height(), 1);
    assert_eq!(valid.column("a").unwrap().i64().unwrap().get(0), Some(1));

    assert_eq!(invalid.get_column_names_str(), ["a", "b", ERROR_REASON_COL]);
    assert_eq!(invalid.height(), 1);
    assert_eq!(invalid.column("a").unwrap().i64().unwrap().get(0), None);
    assert_eq!(invalid.column("b").unwrap().i64().unwrap().get(0), Some(3));
    assert_eq!(
        invalid.column(ERROR_REASON_COL).unwrap().str().unwrap().get(0),
        Some("a not null")
    );
}

#[test]
fn test_error_reason_lists_every_failed_rule() {
    let df = df! {
        "age" => [Some(-1i64), Some(30), None],
        "name" => [Some(""), Some("ann"), Some("bob")],
    }
    .unwrap();
    let rules = rules(json!({
        "age_non_negative": ["age", "ge", 0],
        "name_present": ["name", "matches", "^.+$"],
    }));
    let outcome = validate(df.lazy(), &rules).unwrap();

    let invalid = outcome.invalid.collect().unwrap();
    let reasons: Vec<&str> = invalid
        .column(ERROR_REASON_COL)
        .unwrap()
        .str()
        .unwrap()
        .into_no_null_iter()
        .collect();
    insta::assert_snapshot!(
        reasons.join(" | "),
        @"age_non_negative; name_present | age_non_negative"
    );
    assert_eq!(outcome.valid.collect().unwrap().height(), 1);
}

#[test]
fn test_multi_column_rule_requires_every_column() {
    let df = df! {
        "x" => [1i64, 5, 1],
        "y" => [1i64, 1, 5],
    }
    .unwrap();
    let rules = rules(json!({ "small": [["x", "y"], "is_between", [0, 2]] }));
    let valid = validate(df.lazy(), &rules).unwrap().valid.collect().unwrap();
    assert_eq!(valid.height(), 1);
}

#[test]
fn test_is_in_rule() {
    let df = df! { "status" => ["open", "closed", "lost"] }.unwrap();
    let rules = rules(json!({ "known_status": ["status", "is_in", ["open", "closed"]] }));
    let outcome = validate(df.lazy(), &rules).unwrap();
    assert_eq!(outcome.valid.collect().unwrap().height(), 2);
    assert_eq!(outcome.invalid.collect().unwrap().height(), 1);
}

#[test]
fn test_custom_rule() {
    let rule = Rule::custom(
        "a_less_than_b",
        vec!["a".to_string(), "b".to_string()],
        col("a").lt(col("b")),
    );
    let rules = RuleSet::new().with_rule(rule).unwrap();
    let outcome = validate(test_df().lazy(), &rules).unwrap();
    assert_eq!(outcome.valid.collect().unwrap().height(), 1);
    let invalid = outcome.invalid.collect().unwrap();
    assert_eq!(
        invalid.column(ERROR_REASON_COL).unwrap().str().unwrap().get(0),
        Some("a_less_than_b")
    );
}

#[test]
fn test_check_expected_cols_reports_missing() {
    let rules = rules(json!({ "c positive": ["c", "gt", 0] }));
    let expected = vec!["a".to_string(), "b".to_string()];
    let err = check_expected_cols(&mut test_df().lazy(), Some(&expected), &rules).unwrap_err();
    match err {
        PipelineError::Schema(SchemaError::MissingColumns { missing, .. }) => {
            assert_eq!(missing, ["c"]);
        }
        other => panic!("unexpected error: {other}"),
    }

    check_expected_cols(&mut test_df().lazy(), Some(&expected), &RuleSet::new()).unwrap();
    check_expected_cols(&mut test_df().lazy(), None, &RuleSet::new()).unwrap();
}

proptest! {
    #[test]
    fn prop_partitions_cover_input_exactly(values in proptest::collection::vec(proptest::option::of(-50i64..50), 0..64)) {
        let ids: Vec<i64> = (0..values.len() as i64).collect();
        let df = df! { "id" => ids, "v" => values }.unwrap();
        let rules = rules(json!({
            "v present": ["v", "is_not_null"],
            "v small": ["v", "lt", 25],
        }));
        let outcome = validate(df.clone().lazy(), &rules).unwrap();
        let valid = outcome.valid.collect().unwrap();
        let invalid = outcome.invalid.collect().unwrap();

        prop_assert_eq!(valid.height() + invalid.height(), df.height());

        let mut seen: Vec<i64> = valid
            .column("id").unwrap().i64().unwrap().into_no_null_iter()
            .chain(invalid.column("id").unwrap().i64().unwrap().into_no_null_iter())
            .collect();
        seen.sort_unstable();
        let expected: Vec<i64> = (0..df.height() as i64).collect();
        prop_assert_eq!(seen, expected);
    }
}
