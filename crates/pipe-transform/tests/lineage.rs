//! Tests for row hashing and lineage stamping.

use chrono::{TimeZone, Utc};
use pipe_model::{ROW_HASH_COL, RunContext};
use pipe_transform::{add_hash_col, add_process_cols};
use polars::prelude::*;
use proptest::prelude::*;

fn test_df() -> DataFrame {
    df! {
        "a" => [Some(1i64), Some(2), None],
        "b" => ["x", "y", "z"],
    }
    .unwrap()
}

fn ctx(process: &str) -> RunContext {
    RunContext::new(
        process,
        "7f0c1e9a-run",
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap(),
    )
}

fn hashes(df: &DataFrame) -> Vec<Option<u64>> {
    df.column(ROW_HASH_COL)
        .unwrap()
        .u64()
        .unwrap()
        .into_iter()
        .collect()
}

#[test]
fn test_hash_is_idempotent() {
    let once = add_hash_col(test_df().lazy()).unwrap();
    let first = once.clone().collect().unwrap();
    let twice = add_hash_col(once).unwrap().collect().unwrap();

    assert_eq!(hashes(&first), hashes(&twice));
    assert_eq!(first.width(), twice.width());
}

#[test]
fn test_hash_ignores_row_and_column_order() {
    let base = add_hash_col(test_df().lazy()).unwrap().collect().unwrap();

    let reordered = test_df()
        .lazy()
        .select([col("b"), col("a")])
        .reverse();
    let reordered = add_hash_col(reordered).unwrap().collect().unwrap();

    let mut expected = hashes(&base);
    expected.reverse();
    assert_eq!(hashes(&reordered), expected);
}

#[test]
fn test_hash_ignores_system_columns() {
    let plain = add_hash_col(test_df().lazy()).unwrap().collect().unwrap();
    let stamped = add_process_cols(test_df().lazy(), &ctx("ingest"));
    let stamped = add_hash_col(stamped).unwrap().collect().unwrap();
    assert_eq!(hashes(&plain), hashes(&stamped));
}

#[test]
fn test_hash_distinguishes_null_from_empty() {
    let df = df! { "s" => [None, Some("")] }.unwrap();
    let out = add_hash_col(df.lazy()).unwrap().collect().unwrap();
    let h = hashes(&out);
    assert_ne!(h[0], h[1]);
}

#[test]
fn test_hash_separates_field_boundaries() {
    let df = df! {
        "a" => ["x|", "x", "~"],
        "b" => ["y", "|y", ""],
    }
    .unwrap();
    let out = add_hash_col(df.lazy()).unwrap().collect().unwrap();
    let h = hashes(&out);
    assert_ne!(h[0], h[1]);

    let nulls = df! { "a" => [None, Some("~")] }.unwrap();
    let h = hashes(&add_hash_col(nulls.lazy()).unwrap().collect().unwrap());
    assert_ne!(h[0], h[1]);
}

#[test]
fn test_hash_covers_struct_columns() {
    let lf = test_df()
        .lazy()
        .select([as_struct(vec![col("a"), col("b")]).alias("s")]);
    let out = add_hash_col(lf).unwrap().collect().unwrap();
    let h = hashes(&out);
    assert_eq!(h.len(), 3);
    assert_ne!(h[0], h[1]);
}

#[test]
fn test_process_columns_are_keyed_by_process_name() {
    let lf = add_process_cols(test_df().lazy(), &ctx("team_a"));
    let out = add_process_cols(lf, &ctx("team_b")).collect().unwrap();

    assert_eq!(
        out.get_column_names_str(),
        [
            "a",
            "b",
            "sys_col_team_a_guid",
            "sys_col_team_a_datetime",
            "sys_col_team_b_guid",
            "sys_col_team_b_datetime",
        ]
    );
    let guid = out.column("sys_col_team_a_guid").unwrap().str().unwrap().get(0);
    assert_eq!(guid, Some("7f0c1e9a-run"));
    assert_eq!(
        out.column("sys_col_team_b_datetime").unwrap().dtype(),
        &DataType::Datetime(TimeUnit::Microseconds, None)
    );
}

proptest! {
    #[test]
    fn prop_hash_depends_only_on_row_values(
        rows in proptest::collection::vec(
            (proptest::option::of(-3i64..3), "[a|:~]{0,2}", proptest::option::of("[a|:~]{0,2}")),
            1..24,
        ),
    ) {
        let mut a = Vec::with_capacity(rows.len());
        let mut b = Vec::with_capacity(rows.len());
        let mut c = Vec::with_capacity(rows.len());
        for (x, y, z) in rows {
            a.push(x);
            b.push(y);
            c.push(z);
        }
        let df = df! { "a" => a, "b" => b, "c" => c }.unwrap();
        let forward = hashes(&add_hash_col(df.clone().lazy()).unwrap().collect().unwrap());
        let backward = hashes(
            &add_hash_col(df.clone().lazy().reverse().select([col("c"), col("b"), col("a")]))
                .unwrap()
                .collect()
                .unwrap(),
        );

        let mut expected = forward.clone();
        expected.reverse();
        prop_assert_eq!(backward, expected);

        for i in 0..df.height() {
            for j in 0..df.height() {
                let same_row = df.get(i) == df.get(j);
                prop_assert_eq!(same_row, forward[i] == forward[j]);
            }
        }
    }
}
