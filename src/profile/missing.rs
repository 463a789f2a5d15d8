//! Missing-value profiling: how many entries of each feature sit at or below the LOD.

use crate::data::FeatureTable;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-feature missing counts against a detection cutoff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissingProfile {
    /// Cutoff used; entries `<= cutoff` count as missing.
    pub cutoff: f64,
    /// Number of samples per feature.
    pub n_samples: usize,
    /// Feature identifiers.
    pub feature_ids: Vec<String>,
    /// Missing entries per feature.
    pub n_missing: Vec<usize>,
}

impl MissingProfile {
    /// Number of features with `k` missing entries, for each observed `k`.
    pub fn histogram(&self) -> BTreeMap<usize, usize> {
        let mut hist = BTreeMap::new();
        for &k in &self.n_missing {
            *hist.entry(k).or_insert(0) += 1;
        }
        hist
    }

    /// Features with no entry above the cutoff.
    pub fn n_all_missing(&self) -> usize {
        self.n_missing
            .iter()
            .filter(|&&k| k == self.n_samples)
            .count()
    }

    /// Fraction of all entries counted as missing.
    pub fn missing_fraction(&self) -> f64 {
        let total = self.n_missing.len() * self.n_samples;
        if total == 0 {
            return 0.0;
        }
        self.n_missing.iter().sum::<usize>() as f64 / total as f64
    }
}

impl std::fmt::Display for MissingProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Missing Value Profile (cutoff {})", self.cutoff)?;
        writeln!(f, "  Features:            {}", self.n_missing.len())?;
        writeln!(f, "  Samples:             {}", self.n_samples)?;
        writeln!(f, "  Missing entries:     {:.2}%", self.missing_fraction() * 100.0)?;
        writeln!(f, "  Entirely missing:    {}", self.n_all_missing())?;
        Ok(())
    }
}

/// Count, per feature, the entries at or below `cutoff`.
///
/// `NaN` entries never compare `<=` and are not counted.
pub fn profile_missing(features: &FeatureTable, cutoff: f64) -> MissingProfile {
    let n_missing = (0..features.n_features())
        .into_par_iter()
        .map(|row| {
            features
                .values()
                .row(row)
                .iter()
                .filter(|&&v| v <= cutoff)
                .count()
        })
        .collect();

    MissingProfile {
        cutoff,
        n_samples: features.n_samples(),
        feature_ids: features.feature_ids().to_vec(),
        n_missing,
    }
}
