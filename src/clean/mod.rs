//! Table cleanup: normalization of raw tables and metadata/feature-table alignment.

mod normalize;
mod reconcile;

pub use normalize::{
    normalize_feature_table, normalize_metadata, normalize_text, FeatureColumnSpec,
    DEFAULT_PEAK_SUFFIX, DEFAULT_SAMPLE_MARKERS,
};
pub use reconcile::{reconcile, ReconcileReport};
