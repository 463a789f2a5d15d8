//! Diagnostic chart descriptions.
//!
//! Builders map already-computed tables and summaries to plain chart structs.
//! Each chart can be rendered to a Plotly-compatible figure (`data` +
//! `layout`) as JSON; drawing it is left to whatever consumes the JSON.

pub mod dendrogram;
pub mod frequency;
pub mod heatmap;
pub mod missing;

pub use dendrogram::{dendrogram_from_linkage, dendrogram_plot, DendrogramChart, DendrogramLink};
pub use frequency::{frequency_plot, FrequencyBar, FrequencyBins, FrequencyChart, DEFAULT_BIN_EDGES};
pub use heatmap::{
    clustered_heatmap_plot, heatmap_plot, HeatmapChart, DEFAULT_COLOR_RANGE, DEFAULT_COLOR_SCALE,
};
pub use missing::{missing_values_plot, MissingValuesChart};

use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Bar colour shared by the histogram-style charts.
pub const DEFAULT_MARKER_COLOR: &str = "#696880";

/// Shared figure styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartLayout {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Plotly template name.
    pub template: String,
    pub marker_color: String,
    pub font_color: String,
    pub font_size: u32,
    pub title_color: String,
}

impl Default for ChartLayout {
    fn default() -> Self {
        Self {
            title: String::new(),
            width: 600,
            height: 400,
            template: "plotly_white".to_string(),
            marker_color: DEFAULT_MARKER_COLOR.to_string(),
            font_color: "grey".to_string(),
            font_size: 12,
            title_color: "#3E3D53".to_string(),
        }
    }
}

impl ChartLayout {
    /// Default styling with a title.
    pub fn titled(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Self::default()
        }
    }

    /// Override the figure size.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Plotly `layout` object for this styling.
    pub fn to_plotly(&self) -> Value {
        json!({
            "template": self.template,
            "width": self.width,
            "height": self.height,
            "font": { "color": self.font_color, "size": self.font_size },
            "title": { "text": self.title, "font": { "color": self.title_color } },
        })
    }
}

/// A chart that can be rendered as a Plotly figure.
pub trait Chart {
    /// Figure as `{ "data": [...], "layout": {...} }`.
    fn figure(&self) -> Value;

    /// Figure serialized to pretty JSON.
    fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.figure())?)
    }
}

/// Merge chart-specific keys into a base layout object.
pub(crate) fn extend_layout(layout: &ChartLayout, extra: Value) -> Value {
    let mut base = layout.to_plotly();
    if let (Some(base), Value::Object(extra)) = (base.as_object_mut(), extra) {
        base.extend(extra);
    }
    base
}
