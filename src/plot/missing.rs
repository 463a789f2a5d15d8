//! Histogram of missing values per feature.

use crate::plot::{extend_layout, Chart, ChartLayout};
use crate::profile::MissingProfile;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// How many features have `k` missing entries, for each observed `k`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingValuesChart {
    pub layout: ChartLayout,
    /// `(n_missing, n_features)` pairs, ascending in `n_missing`.
    pub bars: Vec<(usize, usize)>,
}

impl Chart for MissingValuesChart {
    fn figure(&self) -> Value {
        let x: Vec<usize> = self.bars.iter().map(|&(k, _)| k).collect();
        let y: Vec<usize> = self.bars.iter().map(|&(_, n)| n).collect();
        json!({
            "data": [{
                "type": "bar",
                "x": x,
                "y": y,
                "marker": { "color": self.layout.marker_color },
                "showlegend": false,
            }],
            "layout": extend_layout(&self.layout, json!({
                "xaxis": { "title": { "text": "number of missing values" } },
                "yaxis": { "title": { "text": "count" } },
                "bargap": 0.2,
            })),
        })
    }
}

/// Chart the per-feature missing counts of a profile.
pub fn missing_values_plot(profile: &MissingProfile) -> MissingValuesChart {
    MissingValuesChart {
        layout: ChartLayout::titled("MISSING VALUES PER FEATURE"),
        bars: profile.histogram().into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::FeatureTable;
    use crate::profile::profile_missing;

    #[test]
    fn test_missing_values_plot() {
        let table = FeatureTable::from_rows(
            &["a", "b", "c"],
            &["s1", "s2", "s3"],
            &[
                vec![0.0, 2.0, 9.0],
                vec![1.0, 0.0, 8.0],
                vec![0.0, 0.0, 0.0],
            ],
        )
        .unwrap();
        let chart = missing_values_plot(&profile_missing(&table, 2.0));
        // a: 2, b: 2, c: 3
        assert_eq!(chart.bars, vec![(2, 2), (3, 1)]);

        let fig = chart.figure();
        assert_eq!(fig["data"][0]["x"], json!([2, 3]));
        assert_eq!(fig["layout"]["bargap"], 0.2);
    }
}
