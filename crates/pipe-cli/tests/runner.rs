//! Tests for the run orchestration used by `polars-pipe run`.

use std::fs;
use std::path::Path;

use pipe_cli::runner::{build_pipeline, load_config, new_context, open_source, persist};
use pipe_core::prepare;

fn write_fixture(dir: &Path, custom: bool) -> std::path::PathBuf {
    let src = dir.join("orders.csv");
    fs::write(
        &src,
        "id,customer,qty\n1, Ann ,3\n2,bo,\n3,Cy,-1\n4,dee,12\n",
    )
    .unwrap();
    let custom_section = if custom {
        "\n[[custom_transformations]]\nname = \"enrich\"\n"
    } else {
        ""
    };
    let config = format!(
        r#"process_name = "orders_etl"
src_path = '{src}'
src_file_type = "CSV"
dst_root = '{dst}'
dst_file_type = "csv"
expected_cols = ["id", "customer", "qty"]

[validation]
"qty present" = ["qty", "is_not_null"]
"qty non-negative" = ["qty", "ge", 0]

[transformations]
clip_map = {{ qty = [0, 10] }}
rename_map = {{ customer = "client" }}
{custom_section}"#,
        src = src.display(),
        dst = dir.join("out").display(),
    );
    let path = dir.join("pipeline.toml");
    fs::write(&path, config).unwrap();
    path
}

#[test]
fn test_run_from_toml_config() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_fixture(dir.path(), false);

    let config = load_config(&config_path).unwrap();
    let ctx = new_context(&config, Some("run-42")).unwrap();
    let source = open_source(&config).unwrap();
    let pipeline = build_pipeline(config, ctx).unwrap();
    let prepared = prepare(&pipeline, source).unwrap();

    let mut seen = Vec::new();
    let (summary, run_dir) = persist(&pipeline, &prepared, |c| seen.push(c.index)).unwrap();

    assert_eq!(run_dir, dir.path().join("out/run-42"));
    assert_eq!(seen, [0]);
    assert_eq!(summary.input_rows(), 4);
    assert_eq!(summary.valid_rows(), 2);
    assert_eq!(summary.invalid_rows(), 2);

    let transformed =
        fs::read_to_string(run_dir.join("transformed_data/part-00000-run-42.csv")).unwrap();
    let header = transformed.lines().next().unwrap();
    assert!(header.starts_with("id,client,qty,"), "{header}");
    let rows: Vec<&str> = transformed.lines().skip(1).collect();
    assert!(rows[0].starts_with("1,ann,3,"), "{}", rows[0]);
    assert!(rows[1].starts_with("4,dee,10,"), "{}", rows[1]);

    let errors =
        fs::read_to_string(run_dir.join("error_records/part-00000-run-42.csv")).unwrap();
    assert!(errors.contains("qty present"));
    assert!(errors.contains("qty non-negative"));

    let provenance_dir = run_dir.join("config");
    let artifacts: Vec<_> = fs::read_dir(&provenance_dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(artifacts.len(), 1);
    assert!(artifacts[0].starts_with("orders_etl_"));
    assert!(artifacts[0].ends_with(".json"));

    for stats in ["pre_transform", "post_transform"] {
        assert!(
            run_dir
                .join("desc_stats")
                .join(stats)
                .join("part-00000-run-42.csv")
                .exists()
        );
    }
}

#[test]
fn test_unregistered_custom_transform_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_fixture(dir.path(), true);

    let config = load_config(&config_path).unwrap();
    let ctx = new_context(&config, None).unwrap();
    let err = build_pipeline(config, ctx).unwrap_err();
    assert!(format!("{err:#}").contains("enrich"), "{err:#}");
    assert!(!dir.path().join("out").exists());
}

#[test]
fn test_missing_config_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_config(&dir.path().join("absent.toml")).unwrap_err();
    assert!(err.to_string().contains("absent.toml"));
}
