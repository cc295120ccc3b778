//! Typed run configuration.
//!
//! Every transformation stage is optional; an absent stage is an identity.
//! Configuration is loaded from JSON or TOML and rejected on unknown fields,
//! so misspelled stage names fail instead of silently doing nothing.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dtype::DTypeName;
use crate::error::ConfigError;

/// Default per-chunk memory budget (1 GiB).
pub const DEFAULT_CHUNK_BUDGET_BYTES: u64 = 1 << 30;

/// Named rules as written in configuration: `name -> [columns, op, value?]`.
///
/// Kept ordered so rule evaluation and error reasons are deterministic.
pub type RuleConfig = BTreeMap<String, Vec<Value>>;

/// Free-form keyword arguments for derive and custom transformations.
pub type Kwargs = serde_json::Map<String, Value>;

/// Lower and upper clip bounds for one column.
pub type ClipBounds = (Value, Value);

// ============================================================================
// File types
// ============================================================================

/// Supported tabular file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum FileType {
    Csv,
    Parquet,
    /// Newline-delimited JSON.
    Ndjson,
}

impl FileType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Parquet => "parquet",
            Self::Ndjson => "ndjson",
        }
    }

    /// File extension used for written parts.
    pub fn extension(self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "parquet" | "pq" => Ok(Self::Parquet),
            "ndjson" | "jsonl" => Ok(Self::Ndjson),
            "json" => Err(ConfigError::invalid_field(
                "file_type",
                "'json' (a single JSON array document) is not supported; use 'ndjson' for newline-delimited records",
            )),
            other => Err(ConfigError::invalid_field(
                "file_type",
                format!("unsupported file type '{other}' (expected csv, parquet or ndjson)"),
            )),
        }
    }
}

impl TryFrom<String> for FileType {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

fn default_dst_file_type() -> FileType {
    FileType::Parquet
}

// ============================================================================
// Stage configuration
// ============================================================================

/// Columns considered when deduplicating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DedupRepr", into = "DedupRepr")]
pub enum DedupColumns {
    /// `"*"`: every column participates.
    All,
    /// Only the listed columns participate.
    Subset(Vec<String>),
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum DedupRepr {
    Wildcard(String),
    Subset(Vec<String>),
}

impl TryFrom<DedupRepr> for DedupColumns {
    type Error = ConfigError;

    fn try_from(value: DedupRepr) -> Result<Self, Self::Error> {
        match value {
            DedupRepr::Wildcard(s) if s == "*" => Ok(Self::All),
            DedupRepr::Wildcard(s) => Err(ConfigError::invalid_field(
                "deduplicate",
                format!("expected \"*\" or a list of columns, got \"{s}\""),
            )),
            DedupRepr::Subset(cols) if cols.is_empty() => Err(ConfigError::invalid_field(
                "deduplicate",
                "column subset must not be empty",
            )),
            DedupRepr::Subset(cols) => Ok(Self::Subset(cols)),
        }
    }
}

impl From<DedupColumns> for DedupRepr {
    fn from(value: DedupColumns) -> Self {
        match value {
            DedupColumns::All => Self::Wildcard("*".to_string()),
            DedupColumns::Subset(cols) => Self::Subset(cols),
        }
    }
}

/// A derived column: registry function name plus its arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeriveSpec {
    pub fn_name: String,
    #[serde(default)]
    pub fn_kwargs: Kwargs,
}

/// A caller-supplied transformation invoked by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomTransformSpec {
    pub name: String,
    #[serde(default)]
    pub kwargs: Kwargs,
}

/// Optional configuration for each built-in transformation stage.
///
/// Stages run in a fixed order regardless of field order:
/// normalise strings, deduplicate, unnest, filter, fill, recast, clip,
/// derive, rename, nest, drop.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransformConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deduplicate: Option<DedupColumns>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unnest_cols: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_exprs: Option<RuleConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_map: Option<BTreeMap<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recast_map: Option<BTreeMap<String, DTypeName>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clip_map: Option<BTreeMap<String, ClipBounds>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_col_map: Option<BTreeMap<String, DeriveSpec>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rename_map: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nest_cols: Option<BTreeMap<String, Vec<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drop_cols: Option<Vec<String>>,
}

// ============================================================================
// Run configuration
// ============================================================================

/// Complete configuration for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Identifier used for lineage columns and the provenance artifact name.
    pub process_name: String,
    pub src_path: PathBuf,
    pub src_file_type: FileType,
    pub dst_root: PathBuf,
    #[serde(default = "default_dst_file_type")]
    pub dst_file_type: FileType,
    /// Columns the source must provide, checked before anything else runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_cols: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<RuleConfig>,
    #[serde(default)]
    pub transformations: TransformConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_transformations: Option<Vec<CustomTransformSpec>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_budget_bytes: Option<u64>,
    #[serde(default = "default_valid_stem")]
    pub valid_dst_stem: String,
    #[serde(default = "default_invalid_stem")]
    pub invalid_dst_stem: String,
    #[serde(default = "default_config_stem")]
    pub config_dst_stem: String,
    #[serde(default = "default_desc_stats_stem")]
    pub desc_stats_stem: String,
}

fn default_valid_stem() -> String {
    "transformed_data".to_string()
}

fn default_invalid_stem() -> String {
    "error_records".to_string()
}

fn default_config_stem() -> String {
    "config".to_string()
}

fn default_desc_stats_stem() -> String {
    "desc_stats".to_string()
}

impl RunConfig {
    /// Minimal configuration: every stage absent.
    pub fn new(
        process_name: impl Into<String>,
        src_path: impl Into<PathBuf>,
        src_file_type: FileType,
        dst_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            process_name: process_name.into(),
            src_path: src_path.into(),
            src_file_type,
            dst_root: dst_root.into(),
            dst_file_type: default_dst_file_type(),
            expected_cols: None,
            validation: None,
            transformations: TransformConfig::default(),
            custom_transformations: None,
            chunk_budget_bytes: None,
            valid_dst_stem: default_valid_stem(),
            invalid_dst_stem: default_invalid_stem(),
            config_dst_stem: default_config_stem(),
            desc_stats_stem: default_desc_stats_stem(),
        }
    }

    /// Load and check a configuration file (`.json` or `.toml`).
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let config: Self = match extension.as_deref() {
            Some("json") => serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?,
            Some("toml") => toml::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?,
            _ => {
                return Err(ConfigError::UnsupportedFormat {
                    path: path.to_path_buf(),
                });
            }
        };
        config.check()?;
        Ok(config)
    }

    /// Field-level checks that serde cannot express.
    pub fn check(&self) -> Result<(), ConfigError> {
        if self.process_name.is_empty()
            || !self
                .process_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(ConfigError::invalid_field(
                "process_name",
                format!(
                    "'{}' must be non-empty and contain only letters, digits or '_'",
                    self.process_name
                ),
            ));
        }
        if self.chunk_budget_bytes == Some(0) {
            return Err(ConfigError::invalid_field(
                "chunk_budget_bytes",
                "budget must be greater than zero",
            ));
        }
        for (field, stem) in [
            ("valid_dst_stem", &self.valid_dst_stem),
            ("invalid_dst_stem", &self.invalid_dst_stem),
            ("config_dst_stem", &self.config_dst_stem),
            ("desc_stats_stem", &self.desc_stats_stem),
        ] {
            if stem.is_empty() || stem.contains(['/', '\\']) {
                return Err(ConfigError::invalid_field(
                    field,
                    format!("'{stem}' must be a single non-empty path component"),
                ));
            }
        }
        Ok(())
    }

    pub fn chunk_budget(&self) -> u64 {
        self.chunk_budget_bytes
            .unwrap_or(DEFAULT_CHUNK_BUDGET_BYTES)
    }

    /// Names of custom transformations in invocation order.
    pub fn custom_transform_names(&self) -> impl Iterator<Item = &str> {
        self.custom_transformations
            .iter()
            .flatten()
            .map(|spec| spec.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_json() -> serde_json::Value {
        serde_json::json!({
            "process_name": "payroll",
            "src_path": "in.csv",
            "src_file_type": "csv",
            "dst_root": "out"
        })
    }

    #[test]
    fn minimal_config_has_all_stages_absent() {
        let config: RunConfig = serde_json::from_value(base_json()).unwrap();
        assert_eq!(config.transformations, TransformConfig::default());
        assert!(config.validation.is_none());
        assert_eq!(config.dst_file_type, FileType::Parquet);
        assert_eq!(config.chunk_budget(), DEFAULT_CHUNK_BUDGET_BYTES);
        assert_eq!(config.valid_dst_stem, "transformed_data");
        config.check().unwrap();
    }

    #[test]
    fn file_type_is_case_insensitive() {
        let mut json = base_json();
        json["src_file_type"] = "Parquet".into();
        let config: RunConfig = serde_json::from_value(json).unwrap();
        assert_eq!(config.src_file_type, FileType::Parquet);
    }

    #[test]
    fn json_document_is_not_read_as_ndjson() {
        assert_eq!("JSONL".parse::<FileType>().unwrap(), FileType::Ndjson);
        let err = "json".parse::<FileType>().unwrap_err();
        assert!(err.to_string().contains("ndjson"), "{err}");
    }

    #[test]
    fn unknown_stage_is_rejected() {
        let mut json = base_json();
        json["transformations"] = serde_json::json!({ "fill_mapp": { "a": 0 } });
        assert!(serde_json::from_value::<RunConfig>(json).is_err());
    }

    #[test]
    fn deduplicate_accepts_wildcard_or_subset() {
        let all: DedupColumns = serde_json::from_value(serde_json::json!("*")).unwrap();
        assert_eq!(all, DedupColumns::All);
        let subset: DedupColumns = serde_json::from_value(serde_json::json!(["a", "b"])).unwrap();
        assert_eq!(
            subset,
            DedupColumns::Subset(vec!["a".to_string(), "b".to_string()])
        );
        assert!(serde_json::from_value::<DedupColumns>(serde_json::json!("a")).is_err());
        assert!(serde_json::from_value::<DedupColumns>(serde_json::json!([])).is_err());
    }

    #[test]
    fn process_name_must_be_identifier_safe() {
        let mut config: RunConfig = serde_json::from_value(base_json()).unwrap();
        config.process_name = "bad name".to_string();
        assert!(matches!(
            config.check(),
            Err(ConfigError::InvalidField { ref field, .. }) if field == "process_name"
        ));
    }

    #[test]
    fn loads_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.toml");
        std::fs::write(
            &path,
            r#"
process_name = "payroll"
src_path = "in.csv"
src_file_type = "csv"
dst_root = "out"
dst_file_type = "csv"

[validation]
positive_salary = ["salary", "gt", 0]

[transformations]
deduplicate = "*"
drop_cols = ["tmp"]

[transformations.clip_map]
age = [0, 120]

[transformations.new_col_map.total]
fn_name = "add_cols"
fn_kwargs = { cols = ["a", "b"] }
"#,
        )
        .unwrap();

        let config = RunConfig::from_path(&path).unwrap();
        assert_eq!(config.dst_file_type, FileType::Csv);
        assert_eq!(config.transformations.deduplicate, Some(DedupColumns::All));
        let derive = &config.transformations.new_col_map.as_ref().unwrap()["total"];
        assert_eq!(derive.fn_name, "add_cols");
        assert!(config.validation.unwrap().contains_key("positive_salary"));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.yaml");
        std::fs::write(&path, "process_name: x").unwrap();
        assert!(matches!(
            RunConfig::from_path(&path),
            Err(ConfigError::UnsupportedFormat { .. })
        ));
    }
}
