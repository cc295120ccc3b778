//! System column naming.
//!
//! Downstream consumers match these names exactly; they must not change.

/// Prefix shared by every pipeline-managed column.
pub const SYS_COL_PREFIX: &str = "sys_col_";

/// Deterministic per-row hash over all non-system columns.
pub const ROW_HASH_COL: &str = "sys_col_row_hash";

/// Column carried by rejected records listing every failed rule.
pub const ERROR_REASON_COL: &str = "error_reason";

/// Returns true for pipeline-managed columns (hash and lineage).
pub fn is_system_column(name: &str) -> bool {
    name.starts_with(SYS_COL_PREFIX)
}

/// Lineage column holding the run identifier for `process_name`.
pub fn process_guid_col(process_name: &str) -> String {
    format!("{SYS_COL_PREFIX}{process_name}_guid")
}

/// Lineage column holding the processing timestamp for `process_name`.
pub fn process_datetime_col(process_name: &str) -> String {
    format!("{SYS_COL_PREFIX}{process_name}_datetime")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lineage_names_are_keyed_by_process() {
        assert_eq!(process_guid_col("ingest"), "sys_col_ingest_guid");
        assert_eq!(process_datetime_col("ingest"), "sys_col_ingest_datetime");
        assert_ne!(process_guid_col("team_a"), process_guid_col("team_b"));
    }

    #[test]
    fn system_columns_are_detected_by_prefix() {
        assert!(is_system_column(ROW_HASH_COL));
        assert!(is_system_column(&process_guid_col("x")));
        assert!(!is_system_column("sys_colour"));
        assert!(!is_system_column("salary"));
    }
}
