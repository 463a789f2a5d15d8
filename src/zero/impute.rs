//! Random imputation of undetected (zero) intensities below the LOD.

use crate::data::FeatureTable;
use crate::error::{MetaboError, Result};
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Configuration for randomized imputation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImputeConfig {
    /// Seed for reproducible draws. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl ImputeConfig {
    /// Reproducible configuration with a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }
}

/// Replace every zero with an integer drawn uniformly from `[0, cutoff_lod)`.
///
/// Draws are independent per entry. Non-zero and missing entries are kept.
/// A cutoff below 1 leaves an empty range, so every zero stays 0.
pub fn impute(features: &FeatureTable, cutoff_lod: f64, config: &ImputeConfig) -> Result<FeatureTable> {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    impute_with_rng(features, cutoff_lod, &mut rng)
}

/// [`impute`] with a caller-supplied random source.
///
/// Entries are visited feature by feature, so a seeded generator gives the
/// same table on every run.
pub fn impute_with_rng<R: Rng>(
    features: &FeatureTable,
    cutoff_lod: f64,
    rng: &mut R,
) -> Result<FeatureTable> {
    if cutoff_lod.is_nan() {
        return Err(MetaboError::InvalidParameter(
            "LOD cutoff is undefined (table has no non-zero intensity)".to_string(),
        ));
    }
    let upper = cutoff_lod.trunc() as i64;

    let mut values = features.values().clone();
    let mut n_imputed = 0usize;
    for row in 0..values.nrows() {
        for col in 0..values.ncols() {
            if values[(row, col)] == 0.0 {
                values[(row, col)] = if upper >= 1 {
                    rng.random_range(0..upper) as f64
                } else {
                    0.0
                };
                n_imputed += 1;
            }
        }
    }
    debug!("imputed {} zero entries below LOD {}", n_imputed, cutoff_lod);

    FeatureTable::new(
        values,
        features.feature_ids().to_vec(),
        features.sample_ids().to_vec(),
    )
}
