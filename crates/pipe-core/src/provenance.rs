//! Run provenance record.
//!
//! Saved before any chunk is written so every output under a run directory
//! can be traced to the configuration and plan that produced it.

use chrono::{DateTime, Utc};
use pipe_model::{RunConfig, RunContext};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::chunk::ChunkPlan;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub process_name: String,
    pub guid: String,
    pub processed_at: DateTime<Utc>,
    /// SHA-256 of the serialized configuration, hex encoded.
    pub config_sha256: String,
    pub config: RunConfig,
    pub chunk_plan: ChunkPlan,
    /// Optimized logical plan of the transformed output.
    pub optimized_plan: String,
}

impl Provenance {
    pub fn new(
        config: &RunConfig,
        ctx: &RunContext,
        chunk_plan: ChunkPlan,
        optimized_plan: String,
    ) -> Self {
        Self {
            process_name: ctx.process_name.clone(),
            guid: ctx.guid.clone(),
            processed_at: ctx.processed_at,
            config_sha256: config_fingerprint(config),
            config: config.clone(),
            chunk_plan,
            optimized_plan,
        }
    }

    /// Artifact file stem: `{process_name}_{YYYYmmdd_HHMM}`.
    pub fn file_stem(&self) -> String {
        format!(
            "{}_{}",
            self.process_name,
            self.processed_at.format("%Y%m%d_%H%M")
        )
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Hex SHA-256 of the configuration's canonical JSON form.
pub fn config_fingerprint(config: &RunConfig) -> String {
    let mut hasher = Sha256::new();
    if let Ok(bytes) = serde_json::to_vec(config) {
        hasher.update(&bytes);
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pipe_model::FileType;

    use super::*;
    use crate::chunk::{SizeEstimate, chunk_bounds};

    fn config() -> RunConfig {
        RunConfig::new("payroll", "in.csv", FileType::Csv, "out")
    }

    #[test]
    fn fingerprint_tracks_config_changes() {
        let a = config_fingerprint(&config());
        assert_eq!(a.len(), 64);
        assert_eq!(a, config_fingerprint(&config()));

        let mut changed = config();
        changed.expected_cols = Some(vec!["id".to_string()]);
        assert_ne!(a, config_fingerprint(&changed));
    }

    #[test]
    fn file_stem_uses_minute_stamp() {
        let ctx = RunContext::new(
            "payroll",
            "g-1",
            Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
        );
        let plan = ChunkPlan {
            estimate: SizeEstimate { rows: 0, bytes: 0 },
            budget_bytes: 1,
            chunks: chunk_bounds(0, 1),
        };
        let provenance = Provenance::new(&config(), &ctx, plan, String::new());
        assert_eq!(provenance.file_stem(), "payroll_20240102_0304");
        assert_eq!(provenance.file_stem(), format!("payroll_{}", ctx.file_stamp()));
    }
}
