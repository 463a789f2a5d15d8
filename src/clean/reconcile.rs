//! Alignment of metadata rows with feature-table sample columns.

use crate::data::{FeatureTable, Metadata};
use crate::error::Result;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// What `reconcile` kept and removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    /// Samples present in both tables.
    pub n_matched: usize,
    /// Feature-table columns with no metadata row, removed.
    pub dropped_feature_columns: Vec<String>,
    /// Metadata rows with no feature-table column, removed.
    pub dropped_metadata_rows: Vec<String>,
}

impl ReconcileReport {
    /// True if nothing had to be removed.
    pub fn is_aligned(&self) -> bool {
        self.dropped_feature_columns.is_empty() && self.dropped_metadata_rows.is_empty()
    }

    /// True if the two tables share no sample at all.
    pub fn is_disjoint(&self) -> bool {
        self.n_matched == 0
    }
}

impl std::fmt::Display for ReconcileReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_aligned() {
            return writeln!(
                f,
                "All {} files are present in both metadata and feature table.",
                self.n_matched
            );
        }
        writeln!(f, "Not all files are present in both metadata and feature table.")?;
        writeln!(
            f,
            "  {} feature-table columns removed: {}",
            self.dropped_feature_columns.len(),
            self.dropped_feature_columns.join(", ")
        )?;
        writeln!(
            f,
            "  {} metadata rows removed: {}",
            self.dropped_metadata_rows.len(),
            self.dropped_metadata_rows.join(", ")
        )?;
        writeln!(f, "  {} samples matched", self.n_matched)?;
        Ok(())
    }
}

/// Make metadata rows and feature-table columns refer to the same samples.
///
/// If both hold the same sample set (in any order) the tables are returned
/// unchanged. Otherwise every feature-table column missing from the metadata
/// and every metadata row missing from the feature table is dropped; the
/// report names each removed entry. Surviving entries keep their order.
///
/// Re-running on reconciled tables is a no-op.
pub fn reconcile(
    metadata: &Metadata,
    features: &FeatureTable,
) -> Result<(Metadata, FeatureTable, ReconcileReport)> {
    let md_ids: HashSet<&str> = metadata.sample_ids().iter().map(String::as_str).collect();
    let ft_ids: HashSet<&str> = features.sample_ids().iter().map(String::as_str).collect();

    if md_ids == ft_ids {
        info!(
            "All {} files are present in both metadata and feature table",
            features.n_samples()
        );
        let report = ReconcileReport {
            n_matched: features.n_samples(),
            dropped_feature_columns: Vec::new(),
            dropped_metadata_rows: Vec::new(),
        };
        return Ok((metadata.clone(), features.clone(), report));
    }

    let (kept_columns, dropped_feature_columns): (Vec<String>, Vec<String>) = features
        .sample_ids()
        .iter()
        .cloned()
        .partition(|sid| md_ids.contains(sid.as_str()));
    let (kept_rows, dropped_metadata_rows): (Vec<String>, Vec<String>) = metadata
        .sample_ids()
        .iter()
        .cloned()
        .partition(|sid| ft_ids.contains(sid.as_str()));

    warn!(
        "These {} columns of the feature table are not present in metadata and will be removed: {}",
        dropped_feature_columns.len(),
        dropped_feature_columns.join(", ")
    );
    warn!(
        "These {} rows of metadata are not present in the feature table and will be removed: {}",
        dropped_metadata_rows.len(),
        dropped_metadata_rows.join(", ")
    );

    let features = features.select_samples(&kept_columns)?;
    let metadata = metadata.subset_samples(&kept_rows)?;
    let report = ReconcileReport {
        n_matched: kept_columns.len(),
        dropped_feature_columns,
        dropped_metadata_rows,
    };

    Ok((metadata, features, report))
}
