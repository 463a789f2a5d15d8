//! Integration tests for the metabolomics cleanup pipeline.

use composable_metabo::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

/// An MZmine-style export: annotation columns, then one peak-area column per file.
fn create_feature_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "row ID\trow m/z\trow retention time\tannotation\t\
         Blank_1.mzML Peak area\tBlank_2.mzML Peak area\t\
         S1.mzML Peak area\tS2.mzML Peak area\tS3.mzML Peak area\tQC.mzML Peak area"
    )
    .unwrap();
    // feature 1: real; 2: blank ~ sample; 3: absent from blanks; 4: weak blank; 5: contaminant
    writeln!(file, "1\t150.1\t2.3\tcaffeine\t0\t10\t5000\t6000\t7000\t5500").unwrap();
    writeln!(file, "2\t200.2\t3.1\tunknown\t900\t1100\t800\t1000\t1200\t950").unwrap();
    writeln!(file, "3\t250.3\t4.0\t\t0\t0\t0\t300\t450\t400").unwrap();
    writeln!(file, "4\t300.4\t5.2\t\t20\t0\t0\t0\t90\t30").unwrap();
    writeln!(file, "5\t350.5\t6.3\tplasticizer\t5000\t4000\t100\t50\t0\t70").unwrap();
    file.flush().unwrap();
    file
}

fn create_metadata_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "filename\tATTRIBUTE_Sample_Type\tATTRIBUTE_Time").unwrap();
    writeln!(file, "Blank_1.mzML\tblank\t0").unwrap();
    writeln!(file, "Blank_2.mzML\tblank\t0").unwrap();
    writeln!(file, "S1.mzML\t sample \t1").unwrap();
    writeln!(file, "S2.mzML \tsample\t2").unwrap();
    writeln!(file, "S3.mzML\tsample\t3").unwrap();
    writeln!(file, "QC.mzML\tquality control\tNA").unwrap();
    writeln!(file, "Missing.mzML\tsample\t4").unwrap();
    file.flush().unwrap();
    file
}

fn load_inputs() -> (FeatureTable, Metadata) {
    let features = FeatureTable::from_tsv(create_feature_file().path()).unwrap();
    let metadata = Metadata::from_tsv(create_metadata_file().path()).unwrap();
    (features, metadata)
}

#[test]
fn test_loading_skips_text_columns() {
    let (features, metadata) = load_inputs();
    assert_eq!(features.n_features(), 5);
    // annotation is dropped, m/z and RT are numeric and stay until normalization
    assert_eq!(features.n_samples(), 8);
    assert_eq!(metadata.n_samples(), 7);
    assert_eq!(
        metadata.column_type("ATTRIBUTE_Time"),
        Some(VariableType::Continuous)
    );
}

#[test]
fn test_full_cleanup_pipeline() {
    let (features, metadata) = load_inputs();

    let outcome = Pipeline::new()
        .name("cleanup-test")
        .normalize_metadata()
        .normalize_feature_table(FeatureColumnSpec::default())
        .reconcile()
        .filter_blanks("ATTRIBUTE_Sample_Type", &["BLANK"], &["SAMPLE"], DEFAULT_BLANK_CUTOFF)
        .impute(Some(2024))
        .run(&features, &metadata)
        .unwrap();

    let report = outcome.reconcile.as_ref().unwrap();
    assert_eq!(report.n_matched, 6);
    assert!(report.dropped_feature_columns.is_empty());
    assert_eq!(report.dropped_metadata_rows, vec!["Missing.mzML"]);

    // feature 2 has ratio exactly 1, which is not below the cutoff
    let blank = outcome.blank_filter.as_ref().unwrap();
    assert_eq!(blank.n_real, 3);
    assert_eq!(blank.n_background, 2);
    assert_eq!(blank.n_real + blank.n_background, features.n_features());

    assert_eq!(outcome.features.feature_ids(), &["1", "3", "4"]);
    assert_eq!(outcome.features.sample_ids(), &["S1.mzML", "S2.mzML", "S3.mzML"]);
    assert_eq!(outcome.metadata.sample_ids(), outcome.features.sample_ids());

    assert_eq!(outcome.lod, Some(90.0));
    let imputed = outcome.imputed.as_ref().unwrap();
    for r in 0..imputed.n_features() {
        for c in 0..imputed.n_samples() {
            let before = outcome.features.get(r, c);
            let after = imputed.get(r, c);
            if before == 0.0 {
                assert!((0.0..90.0).contains(&after));
            } else {
                assert_eq!(after, before);
            }
        }
    }
}

#[test]
fn test_levels_after_normalization() {
    let (_, metadata) = load_inputs();
    let summary = summarize_levels(&normalize_metadata(&metadata).unwrap());

    assert_eq!(summary.len(), 2);
    let types = summary.get("ATTRIBUTE_Sample_Type").unwrap();
    assert_eq!(types.levels, vec!["SAMPLE", "BLANK", "QUALITY_CONTROL"]);
    assert_eq!(types.counts, vec![4, 2, 1]);

    let text = summary.to_string();
    assert!(text.starts_with("ATTRIBUTES\tLEVELS\tCOUNTS"));
}

#[test]
fn test_heatmap_of_cleaned_table() {
    let (features, metadata) = load_inputs();
    let outcome = run_cleanup(
        &features,
        &metadata,
        "ATTRIBUTE_Sample_Type",
        &["BLANK"],
        &["SAMPLE"],
        Some(1),
    )
    .unwrap();
    let table = outcome.final_features();

    let reordered = reorder_for_heatmap(table).unwrap();
    assert!((reordered.sum() - table.sum()).abs() < 1e-10);

    let mut rows = reordered.feature_ids().to_vec();
    rows.sort();
    assert_eq!(rows, vec!["1", "3", "4"]);
    let mut cols = reordered.sample_ids().to_vec();
    cols.sort();
    assert_eq!(cols, vec!["S1.mzML", "S2.mzML", "S3.mzML"]);

    let chart = heatmap_plot(&reordered);
    assert_eq!(chart.y, reordered.feature_ids());
    assert!(chart.to_json().unwrap().contains("PuOr_r"));
}

#[test]
fn test_diagnostic_charts() {
    let (features, _) = load_inputs();
    let spec = FeatureColumnSpec::default();
    let table = normalize_feature_table(&features, &spec).unwrap();

    let chart = frequency_plot(&table, &FrequencyBins::default());
    assert_eq!(chart.n_values(), 30);
    assert!(chart.bars.iter().all(|b| b.count > 0));

    let lod = estimate_lod(&table);
    assert_eq!(lod, 10.0);
    let missing = missing_values_plot(&profile_missing(&table, lod));
    let n_features: usize = missing.bars.iter().map(|&(_, n)| n).sum();
    assert_eq!(n_features, 5);
}

#[test]
fn test_cleaned_table_round_trip() {
    let (features, metadata) = load_inputs();
    let outcome = run_cleanup(
        &features,
        &metadata,
        "ATTRIBUTE_Sample_Type",
        &["BLANK"],
        &["SAMPLE"],
        Some(5),
    )
    .unwrap();

    let out = NamedTempFile::new().unwrap();
    outcome.final_features().to_tsv(out.path()).unwrap();
    let reloaded = FeatureTable::from_tsv(out.path()).unwrap();
    assert_eq!(&reloaded, outcome.final_features());
}

#[test]
fn test_cache_serves_repeated_stages() {
    let (features, metadata) = load_inputs();
    let mut cache = AnalysisCache::new();
    let spec = FeatureColumnSpec::default();

    for _ in 0..3 {
        let md = cache.normalize_metadata(&metadata).unwrap();
        let ft = cache.normalize_feature_table(&features, &spec).unwrap();
        let (_, ft, _) = cache.reconcile(&md, &ft).unwrap();
        assert_eq!(cache.estimate_lod(&ft), 10.0);
    }
    assert_eq!(cache.stats(), CacheStats { hits: 8, misses: 4 });
}

#[test]
fn test_pipeline_config_file() {
    let config = Pipeline::new()
        .name("from-file")
        .normalize_metadata()
        .normalize_feature_table(FeatureColumnSpec::default())
        .reconcile()
        .to_config(None);

    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", config.to_yaml().unwrap()).unwrap();
    file.flush().unwrap();

    let yaml = std::fs::read_to_string(file.path()).unwrap();
    let pipeline = Pipeline::from_config(&PipelineConfig::from_yaml(&yaml).unwrap());

    let (features, metadata) = load_inputs();
    let outcome = pipeline.run(&features, &metadata).unwrap();
    assert_eq!(outcome.pipeline, "from-file");
    assert_eq!(outcome.features.n_samples(), 6);
    assert!(outcome.imputed.is_none());
}
