//! Canonicalization of metadata text and feature-table sample columns.

use crate::data::{FeatureTable, Metadata};
use crate::error::Result;
use log::{debug, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Substrings marking a column as a raw-data sample file.
pub const DEFAULT_SAMPLE_MARKERS: &[&str] = &[".mzML", ".mzXML"];

/// Suffix appended to sample columns by MZmine peak-area exports.
pub const DEFAULT_PEAK_SUFFIX: &str = " Peak area";

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Which feature-table columns hold sample intensities, and how to name them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeatureColumnSpec {
    /// A column is a sample column if its name contains any of these.
    pub markers: Vec<String>,
    /// Token removed from sample column names.
    pub suffix: String,
}

impl Default for FeatureColumnSpec {
    fn default() -> Self {
        Self {
            markers: DEFAULT_SAMPLE_MARKERS.iter().map(|s| s.to_string()).collect(),
            suffix: DEFAULT_PEAK_SUFFIX.to_string(),
        }
    }
}

impl FeatureColumnSpec {
    /// Does this column name refer to a sample file?
    pub fn is_sample_column(&self, name: &str) -> bool {
        self.markers.iter().any(|m| name.contains(m.as_str()))
    }

    /// Column name with the suffix token and surrounding whitespace removed.
    pub fn sample_name(&self, name: &str) -> String {
        if self.suffix.is_empty() {
            name.trim().to_string()
        } else {
            name.replace(self.suffix.as_str(), "").trim().to_string()
        }
    }
}

/// Canonical form of a free-text metadata value: trimmed, whitespace runs
/// collapsed to `_`, upper-cased.
pub fn normalize_text(value: &str) -> String {
    WHITESPACE
        .replace_all(value.trim(), "_")
        .to_uppercase()
}

/// Normalize sample metadata.
///
/// Trims sample IDs and canonicalizes every categorical (text) value with
/// [`normalize_text`]. Continuous and ordinal columns pass through unchanged.
/// Fails with `DuplicateId` if two IDs collide after trimming.
///
/// Idempotent: normalizing twice gives the same table as normalizing once.
pub fn normalize_metadata(metadata: &Metadata) -> Result<Metadata> {
    let trimmed: Vec<String> = metadata
        .sample_ids()
        .iter()
        .map(|sid| sid.trim().to_string())
        .collect();
    let renamed = metadata.with_sample_ids(trimmed)?;
    Ok(renamed.map_categorical(normalize_text))
}

/// Keep only sample-intensity columns of a raw feature table.
///
/// Columns whose name contains none of `spec.markers` are dropped; the rest are
/// renamed with [`FeatureColumnSpec::sample_name`]. If no column matches, the
/// result has zero sample columns; callers must check `n_samples()`.
pub fn normalize_feature_table(
    features: &FeatureTable,
    spec: &FeatureColumnSpec,
) -> Result<FeatureTable> {
    let keep: Vec<usize> = features
        .sample_ids()
        .iter()
        .enumerate()
        .filter(|(_, name)| spec.is_sample_column(name))
        .map(|(i, _)| i)
        .collect();

    debug!(
        "keeping {} of {} feature-table columns",
        keep.len(),
        features.n_samples()
    );
    if keep.is_empty() {
        warn!("no feature-table column matches {:?}", spec.markers);
    }

    let subset = features.subset_samples(&keep)?;
    let renamed = subset
        .sample_ids()
        .iter()
        .map(|name| spec.sample_name(name))
        .collect();
    subset.with_sample_ids(renamed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Variable, VariableType};
    use crate::error::MetaboError;

    fn create_test_metadata() -> Metadata {
        Metadata::from_columns(
            vec!["  s1 ".into(), "s2".into()],
            vec![
                (
                    "ATTRIBUTE_group".into(),
                    vec![
                        Variable::Categorical("a b".into()),
                        Variable::Categorical("c".into()),
                    ],
                ),
                (
                    "ATTRIBUTE_time".into(),
                    vec![Variable::Continuous(1.5), Variable::Missing],
                ),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  pooled   QC\tmix "), "POOLED_QC_MIX");
        assert_eq!(normalize_text("blank"), "BLANK");
        assert_eq!(normalize_text(""), "");
    }

    #[test]
    fn test_normalize_metadata() {
        let md = create_test_metadata();
        let normalized = normalize_metadata(&md).unwrap();

        assert_eq!(normalized.sample_ids(), &["s1", "s2"]);
        let group: Vec<&str> = normalized
            .column("ATTRIBUTE_group")
            .unwrap()
            .iter()
            .filter_map(|v| v.as_categorical())
            .collect();
        assert_eq!(group, vec!["A_B", "C"]);
        assert_eq!(
            normalized.get("s1", "ATTRIBUTE_time").unwrap().as_continuous(),
            Some(1.5)
        );
        assert_eq!(
            normalized.column_type("ATTRIBUTE_time"),
            Some(VariableType::Continuous)
        );
    }

    #[test]
    fn test_normalize_metadata_idempotent() {
        let md = create_test_metadata();
        let once = normalize_metadata(&md).unwrap();
        let twice = normalize_metadata(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_normalize_metadata_collision() {
        let md = Metadata::from_columns(
            vec!["s1".into(), " s1".into()],
            vec![("g".into(), vec![Variable::Missing, Variable::Missing])],
        )
        .unwrap();
        assert!(matches!(
            normalize_metadata(&md),
            Err(MetaboError::DuplicateId(id)) if id == "s1"
        ));
    }

    #[test]
    fn test_normalize_feature_table() {
        let ft = FeatureTable::from_rows(
            &["f1", "f2"],
            &["row m/z", "sample1.mzML Peak area", "notes", "sample2.mzXML"],
            &[vec![101.2, 5.0, 0.0, 7.0], vec![220.9, 0.0, 1.0, 3.0]],
        )
        .unwrap();

        let normalized = normalize_feature_table(&ft, &FeatureColumnSpec::default()).unwrap();
        assert_eq!(normalized.sample_ids(), &["sample1.mzML", "sample2.mzXML"]);
        assert_eq!(normalized.row(0), vec![5.0, 7.0]);
        assert_eq!(normalized.feature_ids(), ft.feature_ids());
    }

    #[test]
    fn test_normalize_feature_table_no_match() {
        let ft = FeatureTable::from_rows(&["f1"], &["notes", "row m/z"], &[vec![1.0, 2.0]])
            .unwrap();
        let normalized = normalize_feature_table(&ft, &FeatureColumnSpec::default()).unwrap();
        assert_eq!(normalized.n_samples(), 0);
        assert_eq!(normalized.n_features(), 1);
    }

    #[test]
    fn test_custom_spec() {
        let spec = FeatureColumnSpec {
            markers: vec![".raw".into()],
            suffix: ":area".into(),
        };
        assert!(spec.is_sample_column("run01.raw:area"));
        assert!(!spec.is_sample_column("run01.mzML"));
        assert_eq!(spec.sample_name("run01.raw:area "), "run01.raw");
    }
}
