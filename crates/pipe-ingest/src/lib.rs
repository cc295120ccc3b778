//! Source readers.
//!
//! Every reader returns a deferred plan; no rows are read until the plan is
//! materialized, so sources larger than memory can be chunked downstream.

pub mod error;
pub mod reader;

pub use error::{IngestError, Result};
pub use reader::{ScanOptions, scan_source};
