//! Run orchestration shared by the `run` command and its tests.
//!
//! Each step is a separate function so the binary can report progress
//! between them:
//!
//! 1. [`load_config`] reads and checks the configuration file
//! 2. [`new_context`] fixes the run guid and timestamp
//! 3. [`build_pipeline`] validates every name and rule eagerly
//! 4. [`open_source`] scans the source lazily
//! 5. [`pipe_core::prepare`] composes the plan and decides the chunks
//! 6. [`persist`] writes provenance and every chunk under the run directory

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, ensure};
use chrono::Utc;
use pipe_core::{ChunkSummary, Pipeline, PreparedRun, RunSummary, execute};
use pipe_ingest::{ScanOptions, scan_source};
use pipe_model::{RunConfig, RunContext};
use pipe_output::{DirectorySink, OutputLayout};
use pipe_transform::CustomTransformRegistry;
use polars::prelude::LazyFrame;
use tracing::info;
use uuid::Uuid;

pub fn load_config(path: &Path) -> Result<RunConfig> {
    RunConfig::from_path(path).with_context(|| format!("load config {}", path.display()))
}

/// Run identity: the supplied guid or a fresh v4 uuid, stamped now.
pub fn new_context(config: &RunConfig, guid: Option<&str>) -> Result<RunContext> {
    let guid = match guid {
        Some(guid) => {
            ensure!(is_single_component(guid), "guid {guid:?} is not a valid directory name");
            guid.to_string()
        }
        None => Uuid::new_v4().to_string(),
    };
    Ok(RunContext::new(
        config.process_name.clone(),
        guid,
        Utc::now(),
    ))
}

/// The command line has no custom transformations to offer, so any configured
/// `custom_transformations` entry is rejected here.
pub fn build_pipeline(config: RunConfig, ctx: RunContext) -> Result<Pipeline> {
    Pipeline::new(config, ctx, CustomTransformRegistry::new()).context("build pipeline")
}

pub fn open_source(config: &RunConfig) -> Result<LazyFrame> {
    scan_source(&config.src_path, config.src_file_type, &ScanOptions::default())
        .with_context(|| format!("open source {}", config.src_path.display()))
}

/// Persist a prepared run under `{dst_root}/{guid}` and return its summary
/// together with the run directory.
pub fn persist<F>(
    pipeline: &Pipeline,
    prepared: &PreparedRun,
    on_chunk: F,
) -> Result<(RunSummary, PathBuf)>
where
    F: FnMut(&ChunkSummary),
{
    let layout = OutputLayout::from_config(pipeline.config(), &pipeline.context().guid);
    let run_dir = layout.run_dir().to_path_buf();
    let mut sink = DirectorySink::new(layout);

    let summary = execute(pipeline, prepared, &mut sink, on_chunk)
        .with_context(|| format!("write run outputs to {}", run_dir.display()))?;
    info!(
        run_dir = %run_dir.display(),
        chunks = summary.chunks.len(),
        valid = summary.valid_rows(),
        invalid = summary.invalid_rows(),
        "Run complete"
    );
    Ok((summary, run_dir))
}

fn is_single_component(value: &str) -> bool {
    let mut components = Path::new(value).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

#[cfg(test)]
mod tests {
    use pipe_model::FileType;

    use super::*;

    #[test]
    fn explicit_guid_must_be_a_directory_name() {
        let config = RunConfig::new("etl", "in.csv", FileType::Csv, "out");
        assert_eq!(new_context(&config, Some("run-7")).unwrap().guid, "run-7");
        assert!(new_context(&config, Some("../escape")).is_err());
        assert!(new_context(&config, Some("")).is_err());
    }

    #[test]
    fn generated_guid_is_a_uuid() {
        let config = RunConfig::new("etl", "in.csv", FileType::Csv, "out");
        let ctx = new_context(&config, None).unwrap();
        assert!(Uuid::parse_str(&ctx.guid).is_ok());
        assert_eq!(ctx.process_name, "etl");
    }
}
