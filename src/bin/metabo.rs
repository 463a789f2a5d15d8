//! metabo - metabolomics table cleanup CLI
//!
//! Command-line interface for cleaning, profiling and charting feature tables.

use clap::{Parser, Subcommand};
use composable_metabo::clean::FeatureColumnSpec;
use composable_metabo::cluster::cluster_axes;
use composable_metabo::data::{FeatureTable, Metadata};
use composable_metabo::error::{MetaboError, Result};
use composable_metabo::filter::DEFAULT_BLANK_CUTOFF;
use composable_metabo::pipeline::{CleanupOutcome, Pipeline, PipelineConfig};
use composable_metabo::plot::{
    dendrogram_plot, frequency_plot, heatmap_plot, missing_values_plot, Chart, FrequencyBins,
};
use composable_metabo::profile::{profile_missing, summarize_levels};
use composable_metabo::zero::estimate_lod;
use std::path::{Path, PathBuf};

/// Metabolomics feature-table cleanup and exploration
#[derive(Parser)]
#[command(name = "metabo")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize, reconcile, blank-filter and impute a feature table
    Clean {
        /// Path to feature table TSV
        #[arg(short, long)]
        features: PathBuf,

        /// Path to metadata TSV
        #[arg(short, long)]
        metadata: PathBuf,

        /// Metadata attribute separating blanks from samples
        #[arg(short, long, default_value = "ATTRIBUTE_Sample_Type")]
        attribute: String,

        /// Attribute values marking blank injections (after normalization)
        #[arg(long, value_delimiter = ',', default_value = "BLANK")]
        blanks: Vec<String>,

        /// Attribute values marking biological samples (after normalization)
        #[arg(long, value_delimiter = ',', default_value = "SAMPLE")]
        samples: Vec<String>,

        /// Blank/sample ratio cutoff; features need ratio < cutoff
        #[arg(long, default_value_t = DEFAULT_BLANK_CUTOFF)]
        cutoff: f64,

        /// Seed for reproducible imputation
        #[arg(long)]
        seed: Option<u64>,

        /// Skip imputation
        #[arg(long)]
        no_impute: bool,

        /// Output path for the cleaned feature table TSV
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Run a pipeline from a YAML configuration file
    Run {
        /// Path to pipeline configuration YAML
        #[arg(short, long)]
        config: PathBuf,

        /// Path to feature table TSV
        #[arg(short, long)]
        features: PathBuf,

        /// Path to metadata TSV
        #[arg(short, long)]
        metadata: PathBuf,

        /// Output path for the resulting feature table TSV
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Summarize the distinct values of every metadata attribute
    Levels {
        /// Path to metadata TSV
        #[arg(short, long)]
        metadata: PathBuf,

        /// Output format: text or json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Estimate the limit of detection and profile missing values
    Lod {
        /// Path to feature table TSV
        #[arg(short, long)]
        features: PathBuf,

        /// Output format: text or json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Cluster a feature table and write the reordered table and heatmap
    Heatmap {
        /// Path to feature table TSV
        #[arg(short, long)]
        features: PathBuf,

        /// Output path for the reordered table TSV
        #[arg(short, long)]
        output: PathBuf,

        /// Output path for the heatmap figure JSON
        #[arg(long)]
        chart: Option<PathBuf>,

        /// Output path for the feature dendrogram figure JSON
        #[arg(long)]
        dendrogram: Option<PathBuf>,
    },

    /// Write intensity-frequency and missing-value chart JSON
    Frequency {
        /// Path to feature table TSV
        #[arg(short, long)]
        features: PathBuf,

        /// Output path for the frequency figure JSON
        #[arg(short, long)]
        output: PathBuf,

        /// Output path for the missing-values figure JSON
        #[arg(long)]
        missing: Option<PathBuf>,
    },

    /// Generate an example pipeline configuration
    Example {
        /// Output path for the example YAML
        #[arg(short, long, default_value = "pipeline.yaml")]
        output: PathBuf,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Clean {
            features,
            metadata,
            attribute,
            blanks,
            samples,
            cutoff,
            seed,
            no_impute,
            output,
        } => cmd_clean(
            &features, &metadata, &attribute, &blanks, &samples, cutoff, seed, no_impute, &output,
        ),

        Commands::Run {
            config,
            features,
            metadata,
            output,
        } => cmd_run(&config, &features, &metadata, &output),

        Commands::Levels { metadata, format } => cmd_levels(&metadata, &format),

        Commands::Lod { features, format } => cmd_lod(&features, &format),

        Commands::Heatmap {
            features,
            output,
            chart,
            dendrogram,
        } => cmd_heatmap(&features, &output, chart.as_deref(), dendrogram.as_deref()),

        Commands::Frequency {
            features,
            output,
            missing,
        } => cmd_frequency(&features, &output, missing.as_deref()),

        Commands::Example { output } => cmd_example(&output),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_inputs(features_path: &Path, metadata_path: &Path) -> Result<(FeatureTable, Metadata)> {
    eprintln!("Loading data...");
    let features = FeatureTable::from_tsv(features_path)?;
    let metadata = Metadata::from_tsv(metadata_path)?;
    eprintln!(
        "Loaded {} features x {} columns, {} metadata rows",
        features.n_features(),
        features.n_samples(),
        metadata.n_samples()
    );
    Ok((features, metadata))
}

fn report_outcome(outcome: &CleanupOutcome) {
    if let Some(report) = &outcome.reconcile {
        eprint!("{}", report);
    }
    if let Some(blank) = &outcome.blank_filter {
        eprint!("{}", blank);
    }
    if let Some(lod) = outcome.lod {
        eprintln!("Imputed zeros below LOD {}", lod);
    }
}

/// Run the standard cleanup
#[allow(clippy::too_many_arguments)]
fn cmd_clean(
    features_path: &Path,
    metadata_path: &Path,
    attribute: &str,
    blanks: &[String],
    samples: &[String],
    cutoff: f64,
    seed: Option<u64>,
    no_impute: bool,
    output_path: &Path,
) -> Result<()> {
    let (features, metadata) = load_inputs(features_path, metadata_path)?;

    let blanks: Vec<&str> = blanks.iter().map(String::as_str).collect();
    let samples: Vec<&str> = samples.iter().map(String::as_str).collect();
    let mut pipeline = Pipeline::new()
        .name("cleanup")
        .normalize_metadata()
        .normalize_feature_table(FeatureColumnSpec::default())
        .reconcile()
        .filter_blanks(attribute, &blanks, &samples, cutoff);
    if !no_impute {
        pipeline = pipeline.impute(seed);
    }

    let outcome = pipeline.run(&features, &metadata)?;
    report_outcome(&outcome);

    eprintln!("Writing cleaned table to {:?}...", output_path);
    outcome.final_features().to_tsv(output_path)?;
    eprintln!(
        "Done! {} features x {} samples",
        outcome.features.n_features(),
        outcome.features.n_samples()
    );
    Ok(())
}

/// Run a pipeline from configuration
fn cmd_run(
    config_path: &Path,
    features_path: &Path,
    metadata_path: &Path,
    output_path: &Path,
) -> Result<()> {
    eprintln!("Loading pipeline configuration from {:?}...", config_path);
    let config_str = std::fs::read_to_string(config_path)?;
    let config = PipelineConfig::from_yaml(&config_str)?;

    let (features, metadata) = load_inputs(features_path, metadata_path)?;

    eprintln!("Running pipeline '{}'...", config.name);
    let outcome = Pipeline::from_config(&config).run(&features, &metadata)?;
    report_outcome(&outcome);

    eprintln!("Writing results to {:?}...", output_path);
    outcome.final_features().to_tsv(output_path)?;
    Ok(())
}

/// Print the level summary of a metadata table
fn cmd_levels(metadata_path: &Path, format: &str) -> Result<()> {
    let metadata = Metadata::from_tsv(metadata_path)?;
    let summary = summarize_levels(&metadata);

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&summary)?),
        "text" => print!("{}", summary),
        other => {
            return Err(MetaboError::InvalidParameter(format!(
                "Unknown format '{}', expected text or json",
                other
            )))
        }
    }
    Ok(())
}

/// Print the LOD and the missing-value profile of a feature table
fn cmd_lod(features_path: &Path, format: &str) -> Result<()> {
    let features = FeatureTable::from_tsv(features_path)?;
    let lod = estimate_lod(&features);
    if lod.is_nan() {
        return Err(MetaboError::EmptyData(
            "Feature table has no non-zero intensity".to_string(),
        ));
    }
    let profile = profile_missing(&features, lod);

    match format {
        "json" => {
            let out = serde_json::json!({
                "lod": lod,
                "n_features": features.n_features(),
                "n_samples": features.n_samples(),
                "missing_fraction": profile.missing_fraction(),
                "n_all_missing": profile.n_all_missing(),
                "missing_histogram": profile.histogram(),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        "text" => {
            println!("LOD: {}", lod);
            print!("{}", profile);
        }
        other => {
            return Err(MetaboError::InvalidParameter(format!(
                "Unknown format '{}', expected text or json",
                other
            )))
        }
    }
    Ok(())
}

/// Cluster both axes and write the reordered table
fn cmd_heatmap(
    features_path: &Path,
    output_path: &Path,
    chart_path: Option<&Path>,
    dendrogram_path: Option<&Path>,
) -> Result<()> {
    let features = FeatureTable::from_tsv(features_path)?;
    if features.n_features() < 2 || features.n_samples() < 2 {
        return Err(MetaboError::EmptyData(format!(
            "Heatmap needs at least 2 features and 2 samples, got {} x {}",
            features.n_features(),
            features.n_samples()
        )));
    }

    eprintln!(
        "Clustering {} features x {} samples...",
        features.n_features(),
        features.n_samples()
    );
    let order = cluster_axes(&features)?;
    let reordered = features.permute(&order.row_order, &order.col_order)?;

    eprintln!("Writing reordered table to {:?}...", output_path);
    reordered.to_tsv(output_path)?;

    if let Some(path) = chart_path {
        std::fs::write(path, heatmap_plot(&reordered).to_json()?)?;
        eprintln!("Wrote heatmap to {:?}", path);
    }
    if let Some(path) = dendrogram_path {
        std::fs::write(path, dendrogram_plot(&features)?.to_json()?)?;
        eprintln!("Wrote dendrogram to {:?}", path);
    }
    Ok(())
}

/// Write the diagnostic histograms
fn cmd_frequency(features_path: &Path, output_path: &Path, missing_path: Option<&Path>) -> Result<()> {
    let features = FeatureTable::from_tsv(features_path)?;

    let chart = frequency_plot(&features, &FrequencyBins::default());
    std::fs::write(output_path, chart.to_json()?)?;
    eprintln!(
        "Wrote frequency plot of {} values to {:?}",
        chart.n_values(),
        output_path
    );

    if let Some(path) = missing_path {
        let lod = estimate_lod(&features);
        if lod.is_nan() {
            return Err(MetaboError::EmptyData(
                "Feature table has no non-zero intensity".to_string(),
            ));
        }
        let chart = missing_values_plot(&profile_missing(&features, lod));
        std::fs::write(path, chart.to_json()?)?;
        eprintln!("Wrote missing-values plot to {:?}", path);
    }
    Ok(())
}

/// Generate example pipeline configuration
fn cmd_example(output_path: &Path) -> Result<()> {
    let pipeline = Pipeline::new()
        .name("example-cleanup")
        .normalize_metadata()
        .normalize_feature_table(FeatureColumnSpec::default())
        .reconcile()
        .filter_blanks(
            "ATTRIBUTE_Sample_Type",
            &["BLANK"],
            &["SAMPLE"],
            DEFAULT_BLANK_CUTOFF,
        )
        .impute(Some(42));

    let config = pipeline.to_config(Some(
        "Example cleanup: normalize, reconcile, remove blank features, impute",
    ));
    let yaml = config.to_yaml()?;

    std::fs::write(output_path, &yaml)?;
    eprintln!("Wrote example pipeline to {:?}", output_path);
    eprintln!();
    eprintln!("Contents:");
    println!("{}", yaml);

    Ok(())
}
