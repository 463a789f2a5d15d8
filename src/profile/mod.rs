//! Data profiling primitives for metadata and feature tables.

mod levels;
mod missing;

pub use levels::{summarize_levels, AttributeLevels, LevelSummary};
pub use missing::{profile_missing, MissingProfile};
