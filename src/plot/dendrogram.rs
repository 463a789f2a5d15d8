//! Dendrogram link coordinates.
//!
//! Leaves sit at `x = 5, 15, 25, …` in leaf order; every merge draws a
//! bracket from its two children up to its height, like SciPy's dendrogram.

use crate::cluster::{linkage_complete, Linkage};
use crate::data::FeatureTable;
use crate::error::{MetaboError, Result};
use crate::plot::{extend_layout, Chart, ChartLayout};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Spacing between neighbouring leaves.
const LEAF_SPACING: f64 = 10.0;

/// One bracket: left foot, left shoulder, right shoulder, right foot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DendrogramLink {
    pub x: [f64; 4],
    pub y: [f64; 4],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DendrogramChart {
    pub layout: ChartLayout,
    /// Leaf labels, left to right.
    pub labels: Vec<String>,
    /// x position of each label.
    pub tick_positions: Vec<f64>,
    /// One link per merge, in merge order.
    pub links: Vec<DendrogramLink>,
}

impl Chart for DendrogramChart {
    fn figure(&self) -> Value {
        let data: Vec<Value> = self
            .links
            .iter()
            .map(|link| {
                json!({
                    "type": "scatter",
                    "mode": "lines",
                    "x": link.x,
                    "y": link.y,
                    "marker": { "color": self.layout.marker_color },
                    "showlegend": false,
                })
            })
            .collect();
        json!({
            "data": data,
            "layout": extend_layout(&self.layout, json!({
                "xaxis": {
                    "tickvals": self.tick_positions,
                    "ticktext": self.labels,
                    "side": "bottom",
                },
            })),
        })
    }
}

/// Lay out an existing linkage; `labels[i]` names leaf `i`.
pub fn dendrogram_from_linkage(linkage: &Linkage, labels: &[String]) -> Result<DendrogramChart> {
    let n = linkage.n_leaves();
    if labels.len() != n {
        return Err(MetaboError::DimensionMismatch {
            expected: n,
            actual: labels.len(),
        });
    }

    let order = linkage.leaf_order();
    let mut x_pos = vec![0.0; 2 * n - 1];
    for (k, &leaf) in order.iter().enumerate() {
        x_pos[leaf] = LEAF_SPACING * k as f64 + LEAF_SPACING / 2.0;
    }

    let mut links = Vec::with_capacity(n - 1);
    for (i, merge) in linkage.merges().iter().enumerate() {
        let (xl, xr) = (x_pos[merge.left], x_pos[merge.right]);
        let (hl, hr) = (linkage.height(merge.left), linkage.height(merge.right));
        links.push(DendrogramLink {
            x: [xl, xl, xr, xr],
            y: [hl, merge.distance, merge.distance, hr],
        });
        x_pos[n + i] = (xl + xr) / 2.0;
    }

    Ok(DendrogramChart {
        layout: ChartLayout::default(),
        labels: order.iter().map(|&leaf| labels[leaf].clone()).collect(),
        tick_positions: order.iter().map(|&leaf| x_pos[leaf]).collect(),
        links,
    })
}

/// Cluster the rows of `table` and lay out their dendrogram, labelled by feature id.
pub fn dendrogram_plot(table: &FeatureTable) -> Result<DendrogramChart> {
    let linkage = linkage_complete(table.values())?;
    dendrogram_from_linkage(&linkage, table.feature_ids())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_table() -> FeatureTable {
        FeatureTable::from_rows(
            &["a", "b", "c", "d"],
            &["x"],
            &[vec![0.0], vec![10.0], vec![1.0], vec![11.0]],
        )
        .unwrap()
    }

    #[test]
    fn test_leaf_labels_and_ticks() {
        let chart = dendrogram_plot(&create_test_table()).unwrap();
        assert_eq!(chart.labels, vec!["a", "c", "b", "d"]);
        assert_eq!(chart.tick_positions, vec![5.0, 15.0, 25.0, 35.0]);
    }

    #[test]
    fn test_link_coordinates() {
        let chart = dendrogram_plot(&create_test_table()).unwrap();
        assert_eq!(chart.links.len(), 3);
        assert_eq!(chart.links[0].x, [5.0, 5.0, 15.0, 15.0]);
        assert_eq!(chart.links[0].y, [0.0, 1.0, 1.0, 0.0]);
        assert_eq!(chart.links[1].x, [25.0, 25.0, 35.0, 35.0]);
        // root joins the midpoints of the two pairs
        assert_eq!(chart.links[2].x, [10.0, 10.0, 30.0, 30.0]);
        assert_eq!(chart.links[2].y, [1.0, 11.0, 11.0, 1.0]);
    }

    #[test]
    fn test_label_count_checked() {
        let table = create_test_table();
        let linkage = linkage_complete(table.values()).unwrap();
        assert!(dendrogram_from_linkage(&linkage, &["a".to_string()]).is_err());
    }

    #[test]
    fn test_figure_has_one_trace_per_link() {
        let chart = dendrogram_plot(&create_test_table()).unwrap();
        let fig = chart.figure();
        assert_eq!(fig["data"].as_array().unwrap().len(), 3);
        assert_eq!(fig["layout"]["xaxis"]["ticktext"][1], "c");
    }
}
