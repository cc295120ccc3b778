//! Per-run identity.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity of one pipeline run, fixed before the first chunk executes.
///
/// Every chunk of a run stamps the same guid and timestamp, so the context is
/// created once and passed explicitly to every stage that needs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunContext {
    pub process_name: String,
    pub guid: String,
    pub processed_at: DateTime<Utc>,
}

impl RunContext {
    pub fn new(
        process_name: impl Into<String>,
        guid: impl Into<String>,
        processed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            process_name: process_name.into(),
            guid: guid.into(),
            processed_at,
        }
    }

    /// Timestamp stamped on lineage columns (UTC, timezone-naive).
    pub fn naive_timestamp(&self) -> NaiveDateTime {
        self.processed_at.naive_utc()
    }

    /// Compact stamp used in artifact file names (`YYYYmmdd_HHMM`).
    pub fn file_stamp(&self) -> String {
        self.processed_at.format("%Y%m%d_%H%M").to_string()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn file_stamp_is_minute_resolution() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 42).unwrap();
        let ctx = RunContext::new("payroll", "abc", at);
        assert_eq!(ctx.file_stamp(), "20240309_0705");
        assert_eq!(ctx.naive_timestamp(), at.naive_utc());
    }
}
