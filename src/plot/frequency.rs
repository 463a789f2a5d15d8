//! Intensity frequency histogram on logarithmic bins.

use crate::data::FeatureTable;
use crate::error::{MetaboError, Result};
use crate::plot::{extend_layout, Chart, ChartLayout};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// `-1, 0, 1, 10, 1e2, …, 1e10`.
pub const DEFAULT_BIN_EDGES: [f64; 13] = [
    -1.0, 0.0, 1.0, 10.0, 1e2, 1e3, 1e4, 1e5, 1e6, 1e7, 1e8, 1e9, 1e10,
];

/// Right-inclusive bin edges.
///
/// Bin `i` (for `i >= 1`) holds values in `(edges[i - 1], edges[i]]` and is
/// labelled by `edges[i]`. Values at or below the first edge are not binned;
/// values above the last edge fall into one overflow bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyBins {
    edges: Vec<f64>,
}

impl Default for FrequencyBins {
    fn default() -> Self {
        Self {
            edges: DEFAULT_BIN_EDGES.to_vec(),
        }
    }
}

impl FrequencyBins {
    /// Custom edges; at least two, finite and strictly increasing.
    pub fn new(edges: Vec<f64>) -> Result<Self> {
        if edges.len() < 2 {
            return Err(MetaboError::InvalidParameter(
                "Frequency bins need at least 2 edges".to_string(),
            ));
        }
        if edges.iter().any(|e| !e.is_finite()) || edges.windows(2).any(|w| w[0] >= w[1]) {
            return Err(MetaboError::InvalidParameter(format!(
                "Frequency bin edges must be finite and strictly increasing: {:?}",
                edges
            )));
        }
        Ok(Self { edges })
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// Bin index of `value`: number of edges strictly below it.
    ///
    /// 0 means "at or below the first edge", `edges.len()` is the overflow bin.
    pub fn bin_index(&self, value: f64) -> usize {
        self.edges.partition_point(|&e| e < value)
    }

    /// Label of bin `index`.
    pub fn label(&self, index: usize) -> String {
        match self.edges.get(index) {
            Some(&edge) => format_edge(edge),
            None => format!(">{}", format_edge(self.edges[self.edges.len() - 1])),
        }
    }
}

fn format_edge(edge: f64) -> String {
    if edge.abs() < 100.0 {
        format!("{}", edge)
    } else {
        format!("{:e}", edge)
    }
}

/// One non-empty bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyBar {
    pub label: String,
    pub count: usize,
    /// `ln(count + 1)`.
    pub log_count: f64,
}

/// Bars of the intensity frequency plot, lowest bin first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyChart {
    pub layout: ChartLayout,
    pub bars: Vec<FrequencyBar>,
}

impl FrequencyChart {
    /// Total number of binned values.
    pub fn n_values(&self) -> usize {
        self.bars.iter().map(|b| b.count).sum()
    }
}

impl Chart for FrequencyChart {
    fn figure(&self) -> Value {
        let labels: Vec<&str> = self.bars.iter().map(|b| b.label.as_str()).collect();
        let heights: Vec<f64> = self.bars.iter().map(|b| b.log_count).collect();
        json!({
            "data": [{
                "type": "bar",
                "x": labels,
                "y": heights,
                "marker": { "color": self.layout.marker_color },
            }],
            "layout": extend_layout(&self.layout, json!({
                "xaxis": { "title": { "text": "intensity" } },
                "yaxis": { "title": { "text": "Log(Frequency)" } },
            })),
        })
    }
}

/// Count every intensity of `table` into `bins`.
///
/// Missing values and values at or below the first edge are ignored. Bins
/// that end up empty are left out rather than drawn as zero bars.
pub fn frequency_plot(table: &FeatureTable, bins: &FrequencyBins) -> FrequencyChart {
    let mut counts = vec![0usize; bins.edges().len() + 1];
    for &v in table.values().iter().filter(|v| !v.is_nan()) {
        counts[bins.bin_index(v)] += 1;
    }

    let bars = counts
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, &count)| count > 0)
        .map(|(i, &count)| FrequencyBar {
            label: bins.label(i),
            count,
            log_count: (count as f64).ln_1p(),
        })
        .collect();

    FrequencyChart {
        layout: ChartLayout::titled("FEATURE INTENSITY - FREQUENCY PLOT"),
        bars,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_right_inclusive() {
        let bins = FrequencyBins::default();
        assert_eq!(bins.bin_index(-1.0), 0);
        assert_eq!(bins.bin_index(0.0), 1);
        assert_eq!(bins.bin_index(0.5), 2);
        assert_eq!(bins.bin_index(1.0), 2);
        assert_eq!(bins.bin_index(10.0), 3);
        assert_eq!(bins.bin_index(10.5), 4);
        assert_eq!(bins.bin_index(1e10), 12);
        assert_eq!(bins.bin_index(2e10), 13);
    }

    #[test]
    fn test_labels() {
        let bins = FrequencyBins::default();
        assert_eq!(bins.label(1), "0");
        assert_eq!(bins.label(3), "10");
        assert_eq!(bins.label(4), "1e2");
        assert_eq!(bins.label(12), "1e10");
        assert_eq!(bins.label(13), ">1e10");
    }

    #[test]
    fn test_frequency_plot() {
        let table = FeatureTable::from_rows(
            &["a", "b"],
            &["s1", "s2", "s3", "s4"],
            &[
                vec![0.0, 0.0, 5.0, 50.0],
                vec![150.0, 2e10, -3.0, f64::NAN],
            ],
        )
        .unwrap();
        let chart = frequency_plot(&table, &FrequencyBins::default());

        let labels: Vec<&str> = chart.bars.iter().map(|b| b.label.as_str()).collect();
        // 1e1 < 50 <= 1e2; 1e2 < 150 <= 1e3
        assert_eq!(labels, vec!["0", "10", "1e2", "1e3", ">1e10"]);
        assert_eq!(chart.bars[0].count, 2);
        assert!((chart.bars[0].log_count - 3.0f64.ln()).abs() < 1e-10);
        assert!((chart.bars[1].log_count - 2.0f64.ln()).abs() < 1e-10);
        assert_eq!(chart.n_values(), 6);
    }

    #[test]
    fn test_zero_bins_dropped() {
        let table = FeatureTable::from_rows(&["a"], &["s1", "s2"], &[vec![1e6, 1e6]]).unwrap();
        let chart = frequency_plot(&table, &FrequencyBins::default());
        assert_eq!(chart.bars.len(), 1);
        assert_eq!(chart.bars[0].label, "1e6");
        assert_eq!(chart.bars[0].count, 2);
    }

    #[test]
    fn test_custom_bins() {
        assert!(FrequencyBins::new(vec![1.0]).is_err());
        assert!(FrequencyBins::new(vec![0.0, 0.0]).is_err());
        let bins = FrequencyBins::new(vec![0.0, 5.0]).unwrap();
        assert_eq!(bins.bin_index(3.0), 1);
        assert_eq!(bins.label(2), ">5");
    }

    #[test]
    fn test_figure_json() {
        let table = FeatureTable::from_rows(&["a"], &["s1"], &[vec![3.0]]).unwrap();
        let chart = frequency_plot(&table, &FrequencyBins::default());
        let fig = chart.figure();
        assert_eq!(fig["data"][0]["type"], "bar");
        assert_eq!(fig["data"][0]["x"][0], "10");
        assert_eq!(fig["layout"]["title"]["text"], "FEATURE INTENSITY - FREQUENCY PLOT");
        assert!(chart.to_json().unwrap().contains("Log(Frequency)"));
    }
}
