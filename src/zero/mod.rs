//! Zero handling: limit-of-detection estimation and imputation.

pub mod impute;
pub mod lod;

pub use impute::{impute, impute_with_rng, ImputeConfig};
pub use lod::estimate_lod;
