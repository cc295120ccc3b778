//! CLI library components for the pipeline runner.

pub mod logging;
pub mod runner;
