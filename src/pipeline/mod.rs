//! Pipeline composition and execution for metabolomics table cleanup.

mod runner;

pub use runner::{run_cleanup, CleanupOutcome, Pipeline, PipelineConfig, PipelineStep};
