//! Blank-based removal of background features.
//!
//! A feature is background if its average intensity in blank (control)
//! injections is not clearly below its average in biological samples.

use crate::data::{FeatureTable, Metadata};
use crate::error::{MetaboError, Result};
use log::info;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Default blank/sample ratio cutoff; features need `ratio < cutoff` to be kept.
pub const DEFAULT_BLANK_CUTOFF: f64 = 1.0;

/// Outcome of blank filtering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlankFilterResult {
    /// Cutoff the ratios were compared against.
    pub cutoff: f64,
    /// Features classified as background and removed.
    pub n_background: usize,
    /// Features classified as real signal and kept.
    pub n_real: usize,
    /// `(avg_blank + 1) / (avg_samples + 1)` per input feature.
    pub ratios: Vec<f64>,
    /// Classification per input feature.
    pub is_real: Vec<bool>,
}

impl BlankFilterResult {
    /// Number of input features.
    pub fn n_features(&self) -> usize {
        self.n_background + self.n_real
    }
}

impl std::fmt::Display for BlankFilterResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Blank Filter Result (cutoff {})", self.cutoff)?;
        writeln!(f, "  Features before:     {}", self.n_features())?;
        writeln!(f, "  Background features: {}", self.n_background)?;
        writeln!(f, "  Real features:       {}", self.n_real)?;
        Ok(())
    }
}

/// Row-wise mean where any missing replicate makes the mean missing.
pub fn row_means(table: &FeatureTable) -> Vec<f64> {
    (0..table.n_features())
        .into_par_iter()
        .map(|row| table.values().row(row).iter().mean())
        .collect()
}

/// Remove features whose blank signal rivals their sample signal.
///
/// `blanks` and `samples` must share the same features in the same order.
/// For each feature `ratio = (avg_blank + 1) / (avg_samples + 1)`, averages
/// taken over replicates with missing values propagating. A feature is real
/// iff `ratio < cutoff`; a missing ratio is background.
///
/// Returns the sample table restricted to real features, plus the counts.
pub fn filter_blanks(
    blanks: &FeatureTable,
    samples: &FeatureTable,
    cutoff: f64,
) -> Result<(FeatureTable, BlankFilterResult)> {
    if !cutoff.is_finite() || cutoff <= 0.0 {
        return Err(MetaboError::InvalidParameter(format!(
            "Blank cutoff must be a positive number, got {}",
            cutoff
        )));
    }
    if blanks.n_features() != samples.n_features() {
        return Err(MetaboError::DimensionMismatch {
            expected: samples.n_features(),
            actual: blanks.n_features(),
        });
    }
    if blanks.feature_ids() != samples.feature_ids() {
        return Err(MetaboError::InvalidParameter(
            "Blank and sample tables must list the same features in the same order".to_string(),
        ));
    }

    let avg_blank = row_means(blanks);
    let avg_samples = row_means(samples);

    let ratios: Vec<f64> = avg_blank
        .iter()
        .zip(avg_samples.iter())
        .map(|(b, s)| (b + 1.0) / (s + 1.0))
        .collect();
    let is_real: Vec<bool> = ratios.iter().map(|&r| r < cutoff).collect();

    let keep: Vec<usize> = is_real
        .iter()
        .enumerate()
        .filter(|(_, &real)| real)
        .map(|(i, _)| i)
        .collect();
    let n_real = keep.len();
    let n_background = samples.n_features() - n_real;

    info!(
        "blank removal: {} background and {} real features (cutoff {})",
        n_background, n_real, cutoff
    );

    let filtered = samples.subset_features(&keep)?;
    let result = BlankFilterResult {
        cutoff,
        n_background,
        n_real,
        ratios,
        is_real,
    };

    Ok((filtered, result))
}

/// Select the sample columns whose metadata `attribute` takes one of `levels`.
///
/// Values are compared in their string form. Columns keep feature-table order.
/// Every feature-table sample must have a metadata row (reconcile first).
pub fn split_by_attribute(
    features: &FeatureTable,
    metadata: &Metadata,
    attribute: &str,
    levels: &[String],
) -> Result<FeatureTable> {
    if !metadata.has_column(attribute) {
        return Err(MetaboError::MissingColumn(attribute.to_string()));
    }

    let mut selected = Vec::new();
    for (col, sid) in features.sample_ids().iter().enumerate() {
        let value = metadata.get(sid, attribute).ok_or_else(|| {
            MetaboError::SampleMismatch(format!("Sample '{}' not found in metadata", sid))
        })?;
        if !value.is_missing() && levels.contains(&value.to_string()) {
            selected.push(col);
        }
    }

    if selected.is_empty() {
        return Err(MetaboError::EmptyData(format!(
            "No samples with {} in {:?}",
            attribute, levels
        )));
    }

    features.subset_samples(&selected)
}
