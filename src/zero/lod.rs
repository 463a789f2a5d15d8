//! Limit-of-detection estimation.

use crate::data::FeatureTable;

/// Estimate the limit of detection as the smallest observed non-zero intensity.
///
/// Zeros ("not detected") and missing values are ignored. The minimum is
/// rounded to the nearest integer, ties to even. Returns `NaN` if the table has
/// no non-zero value; check with `f64::is_nan` before using the cutoff.
pub fn estimate_lod(features: &FeatureTable) -> f64 {
    features
        .values()
        .iter()
        .copied()
        .filter(|v| !v.is_nan() && *v != 0.0)
        .min_by(|a, b| a.total_cmp(b))
        .map(f64::round_ties_even)
        .unwrap_or(f64::NAN)
}
