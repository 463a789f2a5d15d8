//! Heatmap ordering: cluster both axes of a table and permute it into
//! dendrogram leaf order.

use crate::cluster::linkage::{linkage_complete, Linkage};
use crate::data::FeatureTable;
use crate::error::{MetaboError, Result};
use log::debug;
use serde::{Deserialize, Serialize};

/// Linkages and leaf orders for the rows and columns of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapOrder {
    /// Clustering of rows (features) as observations.
    pub row_linkage: Linkage,
    /// Clustering of columns (samples) as observations.
    pub col_linkage: Linkage,
    /// Row indices in dendrogram leaf order.
    pub row_order: Vec<usize>,
    /// Column indices in dendrogram leaf order.
    pub col_order: Vec<usize>,
}

/// Cluster rows and columns with complete linkage on Euclidean distance.
///
/// Needs at least two rows, at least two columns and no missing values.
pub fn cluster_axes(table: &FeatureTable) -> Result<HeatmapOrder> {
    if table.n_features() < 2 || table.n_samples() < 2 {
        return Err(MetaboError::InvalidParameter(format!(
            "Heatmap clustering needs at least 2 rows and 2 columns, got {} x {}",
            table.n_features(),
            table.n_samples()
        )));
    }

    let row_linkage = linkage_complete(table.values())?;
    let col_linkage = linkage_complete(&table.values().transpose())?;
    let row_order = row_linkage.leaf_order();
    let col_order = col_linkage.leaf_order();

    debug!("heatmap row order {:?}, column order {:?}", row_order, col_order);

    Ok(HeatmapOrder {
        row_linkage,
        col_linkage,
        row_order,
        col_order,
    })
}

/// Permute a table so similar rows and similar columns sit next to each other.
///
/// Labels travel with their values; the multiset of values is unchanged.
pub fn reorder_for_heatmap(table: &FeatureTable) -> Result<FeatureTable> {
    let order = cluster_axes(table)?;
    table.permute(&order.row_order, &order.col_order)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_table() -> FeatureTable {
        FeatureTable::from_rows(
            &["f0", "f1", "f2", "f3"],
            &["s1", "s2", "s3"],
            &[
                vec![0.0, 0.0, 5.0],
                vec![10.0, 10.0, 5.0],
                vec![1.0, 1.0, 5.0],
                vec![11.0, 11.0, 5.0],
            ],
        )
        .unwrap()
    }

    fn sorted(values: &[String]) -> Vec<String> {
        let mut values = values.to_vec();
        values.sort();
        values
    }

    #[test]
    fn test_cluster_axes() {
        let order = cluster_axes(&create_test_table()).unwrap();
        assert_eq!(order.row_order, vec![0, 2, 1, 3]);
        // s1 and s2 are identical and merge first; s3 joins last
        assert_eq!(order.col_order, vec![2, 0, 1]);
        assert_eq!(order.row_linkage.n_leaves(), 4);
        assert_eq!(order.col_linkage.n_leaves(), 3);
    }

    #[test]
    fn test_reorder_for_heatmap() {
        let table = create_test_table();
        let reordered = reorder_for_heatmap(&table).unwrap();

        assert_eq!(reordered.feature_ids(), &["f0", "f2", "f1", "f3"]);
        assert_eq!(reordered.sample_ids(), &["s3", "s1", "s2"]);
        assert_eq!(reordered.row(1), vec![5.0, 1.0, 1.0]);

        assert_eq!(sorted(reordered.feature_ids()), sorted(table.feature_ids()));
        assert_eq!(sorted(reordered.sample_ids()), sorted(table.sample_ids()));
        assert!((reordered.sum() - table.sum()).abs() < 1e-10);
    }

    #[test]
    fn test_values_follow_labels() {
        let table = create_test_table();
        let reordered = reorder_for_heatmap(&table).unwrap();
        for (r, fid) in reordered.feature_ids().iter().enumerate() {
            let src_r = table.feature_ids().iter().position(|f| f == fid).unwrap();
            for (c, sid) in reordered.sample_ids().iter().enumerate() {
                let src_c = table.sample_index(sid).unwrap();
                assert_eq!(reordered.get(r, c), table.get(src_r, src_c));
            }
        }
    }

    #[test]
    fn test_too_small() {
        let one_row = FeatureTable::from_rows(&["f0"], &["s1", "s2"], &[vec![1.0, 2.0]]).unwrap();
        assert!(reorder_for_heatmap(&one_row).is_err());

        let one_col =
            FeatureTable::from_rows(&["f0", "f1"], &["s1"], &[vec![1.0], vec![2.0]]).unwrap();
        assert!(cluster_axes(&one_col).is_err());
    }

    #[test]
    fn test_missing_values_rejected() {
        let table = FeatureTable::from_rows(
            &["f0", "f1"],
            &["s1", "s2"],
            &[vec![1.0, f64::NAN], vec![2.0, 3.0]],
        )
        .unwrap();
        assert!(reorder_for_heatmap(&table).is_err());
    }
}
