//! Persisted run outputs.
//!
//! ```text
//! {dst_root}/{guid}/
//!   config/{process_name}_{YYYYmmdd_HHMM}.json
//!   desc_stats/pre_transform/part-<n>-{guid}.<ext>
//!   desc_stats/post_transform/part-<n>-{guid}.<ext>
//!   error_records/part-<n>-{guid}.<ext>
//!   transformed_data/part-<n>-{guid}.<ext>
//! ```

pub mod error;
pub mod layout;
pub mod sink;
pub mod writer;

pub use error::{OutputError, Result};
pub use layout::{OutputKind, OutputLayout};
pub use sink::DirectorySink;
pub use writer::{ensure_parent_dir, write_frame};
