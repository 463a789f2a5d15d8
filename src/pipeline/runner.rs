//! Pipeline runner for composing and executing cleanup steps.

use crate::clean::{
    normalize_feature_table, normalize_metadata, reconcile, FeatureColumnSpec, ReconcileReport,
};
use crate::data::{FeatureTable, Metadata};
use crate::error::{MetaboError, Result};
use crate::filter::{filter_blanks, split_by_attribute, BlankFilterResult, DEFAULT_BLANK_CUTOFF};
use crate::zero::{estimate_lod, impute, ImputeConfig};
use log::info;
use serde::{Deserialize, Serialize};

/// A step in the cleanup pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PipelineStep {
    /// Trim sample ids and canonicalize text attributes.
    NormalizeMetadata,
    /// Keep sample-intensity columns and strip the tool suffix from their names.
    NormalizeFeatureTable {
        #[serde(default)]
        spec: FeatureColumnSpec,
    },
    /// Drop samples missing from either table.
    Reconcile,
    /// Remove background features using the blank columns picked by `attribute`.
    FilterBlanks {
        attribute: String,
        blank_levels: Vec<String>,
        sample_levels: Vec<String>,
        cutoff: f64,
    },
    /// Replace zeros with random values below the estimated LOD.
    Impute { seed: Option<u64> },
}

/// Pipeline configuration for serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Name of the pipeline.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Steps to execute.
    pub steps: Vec<PipelineStep>,
}

impl PipelineConfig {
    /// Load from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(MetaboError::from)
    }

    /// Save to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(MetaboError::from)
    }
}

/// Everything a cleanup run produced.
#[derive(Debug, Clone)]
pub struct CleanupOutcome {
    /// Name of the pipeline that produced this outcome.
    pub pipeline: String,
    /// Metadata after the last step.
    pub metadata: Metadata,
    /// Feature table after the last non-imputing step.
    pub features: FeatureTable,
    pub reconcile: Option<ReconcileReport>,
    pub blank_filter: Option<BlankFilterResult>,
    /// LOD the imputation was bounded by.
    pub lod: Option<f64>,
    pub imputed: Option<FeatureTable>,
}

impl CleanupOutcome {
    /// The imputed table if imputation ran, else the cleaned one.
    pub fn final_features(&self) -> &FeatureTable {
        self.imputed.as_ref().unwrap_or(&self.features)
    }
}

/// Builder for constructing and running cleanup pipelines.
#[derive(Debug, Clone)]
pub struct Pipeline {
    steps: Vec<PipelineStep>,
    name: String,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    /// Create a new empty pipeline.
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            name: "unnamed".to_string(),
        }
    }

    /// Create from a config.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            steps: config.steps.clone(),
            name: config.name.clone(),
        }
    }

    /// Set the pipeline name.
    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn steps(&self) -> &[PipelineStep] {
        &self.steps
    }

    pub fn normalize_metadata(mut self) -> Self {
        self.steps.push(PipelineStep::NormalizeMetadata);
        self
    }

    pub fn normalize_feature_table(mut self, spec: FeatureColumnSpec) -> Self {
        self.steps.push(PipelineStep::NormalizeFeatureTable { spec });
        self
    }

    pub fn reconcile(mut self) -> Self {
        self.steps.push(PipelineStep::Reconcile);
        self
    }

    /// Blank filtering; `blank_levels` and `sample_levels` are values of `attribute`.
    pub fn filter_blanks(
        mut self,
        attribute: &str,
        blank_levels: &[&str],
        sample_levels: &[&str],
        cutoff: f64,
    ) -> Self {
        self.steps.push(PipelineStep::FilterBlanks {
            attribute: attribute.to_string(),
            blank_levels: blank_levels.iter().map(|s| s.to_string()).collect(),
            sample_levels: sample_levels.iter().map(|s| s.to_string()).collect(),
            cutoff,
        });
        self
    }

    pub fn impute(mut self, seed: Option<u64>) -> Self {
        self.steps.push(PipelineStep::Impute { seed });
        self
    }

    /// Convert to config for serialization.
    pub fn to_config(&self, description: Option<&str>) -> PipelineConfig {
        PipelineConfig {
            name: self.name.clone(),
            description: description.map(String::from),
            steps: self.steps.clone(),
        }
    }

    /// Run the pipeline on a feature table and its metadata.
    pub fn run(&self, features: &FeatureTable, metadata: &Metadata) -> Result<CleanupOutcome> {
        let mut state = PipelineState::new(features.clone(), metadata.clone());

        for (i, step) in self.steps.iter().enumerate() {
            state = state.apply(step).map_err(|e| {
                MetaboError::Pipeline(format!("Step {} ({:?}) failed: {}", i + 1, step, e))
            })?;
        }

        info!(
            "pipeline '{}' finished: {} features x {} samples",
            self.name,
            state.features.n_features(),
            state.features.n_samples()
        );
        Ok(state.finalize(&self.name))
    }
}

/// Internal state during pipeline execution.
struct PipelineState {
    features: FeatureTable,
    metadata: Metadata,
    reconcile: Option<ReconcileReport>,
    blank_filter: Option<BlankFilterResult>,
    lod: Option<f64>,
    imputed: Option<FeatureTable>,
}

impl PipelineState {
    fn new(features: FeatureTable, metadata: Metadata) -> Self {
        Self {
            features,
            metadata,
            reconcile: None,
            blank_filter: None,
            lod: None,
            imputed: None,
        }
    }

    fn apply(mut self, step: &PipelineStep) -> Result<Self> {
        match step {
            PipelineStep::NormalizeMetadata => {
                self.metadata = normalize_metadata(&self.metadata)?;
            }
            PipelineStep::NormalizeFeatureTable { spec } => {
                self.features = normalize_feature_table(&self.features, spec)?;
                if self.features.n_samples() == 0 {
                    return Err(MetaboError::EmptyData(format!(
                        "No feature-table column matches any of {:?}",
                        spec.markers
                    )));
                }
            }
            PipelineStep::Reconcile => {
                let (metadata, features, report) = reconcile(&self.metadata, &self.features)?;
                if report.is_disjoint() {
                    return Err(MetaboError::EmptyData(
                        "Metadata and feature table share no sample".to_string(),
                    ));
                }
                self.metadata = metadata;
                self.features = features;
                self.reconcile = Some(report);
            }
            PipelineStep::FilterBlanks {
                attribute,
                blank_levels,
                sample_levels,
                cutoff,
            } => {
                let blanks =
                    split_by_attribute(&self.features, &self.metadata, attribute, blank_levels)?;
                let samples =
                    split_by_attribute(&self.features, &self.metadata, attribute, sample_levels)?;
                let (filtered, result) = filter_blanks(&blanks, &samples, *cutoff)?;
                self.metadata = self.metadata.subset_samples(filtered.sample_ids())?;
                self.features = filtered;
                self.blank_filter = Some(result);
            }
            PipelineStep::Impute { seed } => {
                let lod = estimate_lod(&self.features);
                if lod.is_nan() {
                    return Err(MetaboError::EmptyData(
                        "Cannot estimate LOD: no non-zero intensity".to_string(),
                    ));
                }
                let config = ImputeConfig { seed: *seed };
                self.imputed = Some(impute(&self.features, lod, &config)?);
                self.lod = Some(lod);
            }
        }
        Ok(self)
    }

    fn finalize(self, name: &str) -> CleanupOutcome {
        CleanupOutcome {
            pipeline: name.to_string(),
            metadata: self.metadata,
            features: self.features,
            reconcile: self.reconcile,
            blank_filter: self.blank_filter,
            lod: self.lod,
            imputed: self.imputed,
        }
    }
}

/// Convenience function running every cleanup stage in order.
///
/// Blanks and samples are told apart by `attribute`; the default column spec
/// and blank cutoff apply.
pub fn run_cleanup(
    features: &FeatureTable,
    metadata: &Metadata,
    attribute: &str,
    blank_levels: &[&str],
    sample_levels: &[&str],
    seed: Option<u64>,
) -> Result<CleanupOutcome> {
    Pipeline::new()
        .name("cleanup")
        .normalize_metadata()
        .normalize_feature_table(FeatureColumnSpec::default())
        .reconcile()
        .filter_blanks(attribute, blank_levels, sample_levels, DEFAULT_BLANK_CUTOFF)
        .impute(seed)
        .run(features, metadata)
}
