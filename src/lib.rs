//! Composable Metabolomics Table Cleanup Library
//!
//! This library provides modular primitives for cleaning and exploring
//! metabolomics feature tables (feature × sample intensity matrices) together
//! with their sample metadata.
//!
//! # Overview
//!
//! The library is organized into composable modules:
//!
//! - **data**: Core data structures (FeatureTable, Metadata)
//! - **clean**: Table normalization and metadata/feature-table reconciliation
//! - **profile**: Data profiling (attribute levels, missing values)
//! - **zero**: Limit-of-detection estimation and seedable imputation
//! - **filter**: Blank-based background feature removal
//! - **cluster**: Complete-linkage clustering and heatmap reordering
//! - **plot**: Diagnostic chart descriptions (Plotly JSON)
//! - **cache**: Content-hash memoization of the deterministic stages
//! - **pipeline**: Pipeline composition and execution
//!
//! # Example
//!
//! ```no_run
//! use composable_metabo::prelude::*;
//!
//! // Load data
//! let features = FeatureTable::from_tsv("feature_table.tsv").unwrap();
//! let metadata = Metadata::from_tsv("metadata.tsv").unwrap();
//!
//! // Run cleanup pipeline
//! let outcome = Pipeline::new()
//!     .normalize_metadata()
//!     .normalize_feature_table(FeatureColumnSpec::default())
//!     .reconcile()
//!     .filter_blanks("ATTRIBUTE_Sample_Type", &["BLANK"], &["SAMPLE"], 1.0)
//!     .impute(Some(42))
//!     .run(&features, &metadata)
//!     .unwrap();
//!
//! let heatmap = reorder_for_heatmap(outcome.final_features()).unwrap();
//! ```

pub mod cache;
pub mod clean;
pub mod cluster;
pub mod data;
pub mod error;
pub mod filter;
pub mod pipeline;
pub mod plot;
pub mod profile;
pub mod zero;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::cache::{content_hash, AnalysisCache, CacheStats};
    pub use crate::clean::{
        normalize_feature_table, normalize_metadata, reconcile, FeatureColumnSpec,
        ReconcileReport, DEFAULT_PEAK_SUFFIX, DEFAULT_SAMPLE_MARKERS,
    };
    pub use crate::cluster::{
        cluster_axes, linkage_complete, reorder_for_heatmap, HeatmapOrder, Linkage, Merge,
    };
    pub use crate::data::{FeatureTable, Metadata, Variable, VariableType};
    pub use crate::error::{MetaboError, Result};
    pub use crate::filter::{
        filter_blanks, row_means, split_by_attribute, BlankFilterResult, DEFAULT_BLANK_CUTOFF,
    };
    pub use crate::pipeline::{run_cleanup, CleanupOutcome, Pipeline, PipelineConfig, PipelineStep};
    pub use crate::plot::{
        clustered_heatmap_plot, dendrogram_plot, frequency_plot, heatmap_plot,
        missing_values_plot, Chart, ChartLayout, FrequencyBins, DEFAULT_BIN_EDGES,
    };
    pub use crate::profile::{
        profile_missing, summarize_levels, AttributeLevels, LevelSummary, MissingProfile,
    };
    pub use crate::zero::{estimate_lod, impute, impute_with_rng, ImputeConfig};
}
