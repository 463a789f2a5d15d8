//! Heatmap of a (usually clustered and scaled) intensity table.

use crate::cluster::reorder_for_heatmap;
use crate::data::FeatureTable;
use crate::error::Result;
use crate::plot::{extend_layout, Chart, ChartLayout};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Diverging Plotly colour scale.
pub const DEFAULT_COLOR_SCALE: &str = "PuOr_r";

/// Symmetric colour range, suited to z-scored intensities.
pub const DEFAULT_COLOR_RANGE: [f64; 2] = [-3.0, 3.0];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapChart {
    pub layout: ChartLayout,
    /// Column labels (samples).
    pub x: Vec<String>,
    /// Row labels (features).
    pub y: Vec<String>,
    /// Row-major cell values; missing values serialize as `null`.
    pub z: Vec<Vec<f64>>,
    pub color_scale: String,
    pub color_range: [f64; 2],
}

impl Chart for HeatmapChart {
    fn figure(&self) -> Value {
        json!({
            "data": [{
                "type": "heatmap",
                "x": self.x,
                "y": self.y,
                "z": self.z,
                "colorscale": self.color_scale,
                "zmin": self.color_range[0],
                "zmax": self.color_range[1],
                "texttemplate": "%{z}",
            }],
            "layout": extend_layout(&self.layout, json!({
                "autosize": false,
                "xaxis": { "title": { "text": "" }, "tickangle": 35 },
                "yaxis": { "title": { "text": "" } },
            })),
        })
    }
}

/// Heatmap of `table` as given; rows are features, columns samples.
pub fn heatmap_plot(table: &FeatureTable) -> HeatmapChart {
    HeatmapChart {
        layout: ChartLayout::default().with_size(700, 1200),
        x: table.sample_ids().to_vec(),
        y: table.feature_ids().to_vec(),
        z: (0..table.n_features()).map(|r| table.row(r)).collect(),
        color_scale: DEFAULT_COLOR_SCALE.to_string(),
        color_range: DEFAULT_COLOR_RANGE,
    }
}

/// Reorder both axes by clustering, then build the heatmap.
pub fn clustered_heatmap_plot(table: &FeatureTable) -> Result<HeatmapChart> {
    Ok(heatmap_plot(&reorder_for_heatmap(table)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heatmap_plot() {
        let table = FeatureTable::from_rows(
            &["f1", "f2"],
            &["s1", "s2", "s3"],
            &[vec![-1.0, 0.0, 1.0], vec![2.0, f64::NAN, -2.0]],
        )
        .unwrap();
        let chart = heatmap_plot(&table);
        assert_eq!(chart.x, vec!["s1", "s2", "s3"]);
        assert_eq!(chart.y, vec!["f1", "f2"]);
        assert_eq!(chart.z[0], vec![-1.0, 0.0, 1.0]);
        assert_eq!(chart.color_range, [-3.0, 3.0]);

        let fig = chart.figure();
        assert_eq!(fig["data"][0]["colorscale"], "PuOr_r");
        assert!(fig["data"][0]["z"][1][1].is_null());
        assert_eq!(fig["layout"]["height"], 1200);
    }

    #[test]
    fn test_clustered_heatmap_plot() {
        let table = FeatureTable::from_rows(
            &["f0", "f1", "f2", "f3"],
            &["s1", "s2", "s3"],
            &[
                vec![0.0, 0.0, 5.0],
                vec![10.0, 10.0, 5.0],
                vec![1.0, 1.0, 5.0],
                vec![11.0, 11.0, 5.0],
            ],
        )
        .unwrap();
        let chart = clustered_heatmap_plot(&table).unwrap();
        assert_eq!(chart.y, vec!["f0", "f2", "f1", "f3"]);
        assert_eq!(chart.x, vec!["s3", "s1", "s2"]);
    }
}
