//! Run directory layout.

use std::path::{Path, PathBuf};

use pipe_model::{FileType, RunConfig};

const PRE_TRANSFORM_DIR: &str = "pre_transform";
const POST_TRANSFORM_DIR: &str = "post_transform";

/// Kinds of per-chunk output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputKind {
    TransformedData,
    ErrorRecords,
    PreTransformStats,
    PostTransformStats,
}

impl OutputKind {
    pub const ALL: [Self; 4] = [
        Self::TransformedData,
        Self::ErrorRecords,
        Self::PreTransformStats,
        Self::PostTransformStats,
    ];
}

/// Paths for every artifact of one run, rooted at `{dst_root}/{guid}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    run_dir: PathBuf,
    guid: String,
    file_type: FileType,
    valid_stem: String,
    invalid_stem: String,
    config_stem: String,
    desc_stats_stem: String,
}

impl OutputLayout {
    pub fn from_config(config: &RunConfig, guid: &str) -> Self {
        Self {
            run_dir: config.dst_root.join(guid),
            guid: guid.to_string(),
            file_type: config.dst_file_type,
            valid_stem: config.valid_dst_stem.clone(),
            invalid_stem: config.invalid_dst_stem.clone(),
            config_stem: config.config_dst_stem.clone(),
            desc_stats_stem: config.desc_stats_stem.clone(),
        }
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    pub fn file_type(&self) -> FileType {
        self.file_type
    }

    /// `config/{stem}.json`
    pub fn provenance_path(&self, stem: &str) -> PathBuf {
        self.run_dir
            .join(&self.config_stem)
            .join(format!("{stem}.json"))
    }

    pub fn dir(&self, kind: OutputKind) -> PathBuf {
        match kind {
            OutputKind::TransformedData => self.run_dir.join(&self.valid_stem),
            OutputKind::ErrorRecords => self.run_dir.join(&self.invalid_stem),
            OutputKind::PreTransformStats => self
                .run_dir
                .join(&self.desc_stats_stem)
                .join(PRE_TRANSFORM_DIR),
            OutputKind::PostTransformStats => self
                .run_dir
                .join(&self.desc_stats_stem)
                .join(POST_TRANSFORM_DIR),
        }
    }

    /// `part-<n>-{guid}.<ext>` under the directory for `kind`.
    pub fn part_path(&self, kind: OutputKind, index: usize) -> PathBuf {
        self.dir(kind).join(format!(
            "part-{index:05}-{}.{}",
            self.guid,
            self.file_type.extension()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_follow_run_layout() {
        let mut config = RunConfig::new("payroll", "in.csv", FileType::Csv, "/data/out");
        config.dst_file_type = FileType::Parquet;
        let layout = OutputLayout::from_config(&config, "abc");

        assert_eq!(layout.run_dir(), Path::new("/data/out/abc"));
        assert_eq!(
            layout.provenance_path("payroll_20240101_0000"),
            Path::new("/data/out/abc/config/payroll_20240101_0000.json")
        );
        assert_eq!(
            layout.part_path(OutputKind::TransformedData, 3),
            Path::new("/data/out/abc/transformed_data/part-00003-abc.parquet")
        );
        assert_eq!(
            layout.part_path(OutputKind::PreTransformStats, 0),
            Path::new("/data/out/abc/desc_stats/pre_transform/part-00000-abc.parquet")
        );
        assert_eq!(
            layout.dir(OutputKind::ErrorRecords),
            Path::new("/data/out/abc/error_records")
        );
    }
}
