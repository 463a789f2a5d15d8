//! Hierarchical clustering and heatmap reordering.

pub mod linkage;
pub mod reorder;

pub use linkage::{linkage_complete, pairwise_euclidean, Linkage, Merge};
pub use reorder::{cluster_axes, reorder_for_heatmap, HeatmapOrder};
