//! Dense feature table holding metabolite intensities across samples.

use crate::clean::DEFAULT_SAMPLE_MARKERS;
use crate::error::{MetaboError, Result};
use log::debug;
use nalgebra::DMatrix;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::path::Path;

/// An intensity matrix storing feature abundances across samples.
///
/// Rows represent features (metabolites, compounds), columns represent samples.
/// A value of `0.0` means "not detected"; `NaN` marks a missing measurement.
#[derive(Debug, Clone)]
pub struct FeatureTable {
    /// Dense matrix (features × samples)
    data: DMatrix<f64>,
    /// Feature identifiers (row names)
    feature_ids: Vec<String>,
    /// Sample identifiers (column names)
    sample_ids: Vec<String>,
}

impl FeatureTable {
    /// Create a new FeatureTable from a dense matrix and identifiers.
    ///
    /// Sample identifiers must be unique.
    pub fn new(
        data: DMatrix<f64>,
        feature_ids: Vec<String>,
        sample_ids: Vec<String>,
    ) -> Result<Self> {
        let (nrows, ncols) = data.shape();
        if nrows != feature_ids.len() {
            return Err(MetaboError::DimensionMismatch {
                expected: nrows,
                actual: feature_ids.len(),
            });
        }
        if ncols != sample_ids.len() {
            return Err(MetaboError::DimensionMismatch {
                expected: ncols,
                actual: sample_ids.len(),
            });
        }
        let mut seen = HashSet::with_capacity(sample_ids.len());
        for sid in &sample_ids {
            if !seen.insert(sid.as_str()) {
                return Err(MetaboError::DuplicateId(sid.clone()));
            }
        }
        Ok(Self {
            data,
            feature_ids,
            sample_ids,
        })
    }

    /// Build a table from row-major values.
    pub fn from_rows<F, S>(feature_ids: &[F], sample_ids: &[S], rows: &[Vec<f64>]) -> Result<Self>
    where
        F: AsRef<str>,
        S: AsRef<str>,
    {
        if rows.len() != feature_ids.len() {
            return Err(MetaboError::DimensionMismatch {
                expected: feature_ids.len(),
                actual: rows.len(),
            });
        }
        let n_samples = sample_ids.len();
        if let Some(bad) = rows.iter().find(|r| r.len() != n_samples) {
            return Err(MetaboError::DimensionMismatch {
                expected: n_samples,
                actual: bad.len(),
            });
        }
        let data = DMatrix::from_fn(rows.len(), n_samples, |r, c| rows[r][c]);
        Self::new(
            data,
            feature_ids.iter().map(|s| s.as_ref().to_string()).collect(),
            sample_ids.iter().map(|s| s.as_ref().to_string()).collect(),
        )
    }

    /// Load a feature table from a TSV file.
    ///
    /// Expected format:
    /// - First row: header (first column is the feature ID header)
    /// - Subsequent rows: feature ID followed by intensities
    ///
    /// Purely textual columns (annotations, notes) are skipped. A column that
    /// mixes numbers with text, or whose name carries a sample marker such as
    /// `.mzML`, fails with `InvalidValue` at the first bad cell (`row` counts
    /// feature rows, `col` counts file columns, both from 0).
    /// Empty cells and `NA` are read as missing.
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .from_path(path)?;

        let header: Vec<String> = reader.headers()?.iter().map(String::from).collect();
        if header.len() < 2 {
            return Err(MetaboError::EmptyData(
                "TSV must have at least one sample column".to_string(),
            ));
        }

        let mut feature_ids = Vec::new();
        let mut cells: Vec<Vec<String>> = Vec::new();
        for record in reader.records() {
            let record = record?;
            if record.iter().all(|field| field.trim().is_empty()) {
                continue;
            }
            feature_ids.push(record.get(0).unwrap_or_default().trim().to_string());
            cells.push(record.iter().skip(1).map(String::from).collect());
        }

        if feature_ids.is_empty() {
            return Err(MetaboError::EmptyData("No features in TSV".to_string()));
        }

        let n_cols = header.len() - 1;
        let mut keep = Vec::with_capacity(n_cols);
        for col in 0..n_cols {
            let name = &header[col + 1];
            let Some(bad_row) = cells
                .iter()
                .position(|row| parse_intensity(&row[col]).is_none())
            else {
                keep.push(col);
                continue;
            };
            let has_numbers = cells
                .iter()
                .any(|row| parse_intensity(&row[col]).is_some_and(|v| !v.is_nan()));
            let is_sample = DEFAULT_SAMPLE_MARKERS.iter().any(|m| name.contains(m));
            if has_numbers || is_sample {
                return Err(MetaboError::InvalidValue {
                    value: cells[bad_row][col].trim().to_string(),
                    row: bad_row,
                    col: col + 1,
                });
            }
            debug!("skipping text column '{}'", name);
        }

        let data = DMatrix::from_fn(feature_ids.len(), keep.len(), |r, c| {
            parse_intensity(&cells[r][keep[c]]).unwrap_or(f64::NAN)
        });
        let sample_ids = keep.iter().map(|&c| header[c + 1].clone()).collect();

        Self::new(data, feature_ids, sample_ids)
    }

    /// Write the feature table to a TSV file. Missing values are written as `NA`.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_path(path)?;

        let mut header = Vec::with_capacity(self.n_samples() + 1);
        header.push("feature_id".to_string());
        header.extend(self.sample_ids.iter().cloned());
        writer.write_record(&header)?;

        for (row, feature_id) in self.feature_ids.iter().enumerate() {
            let mut record = Vec::with_capacity(self.n_samples() + 1);
            record.push(feature_id.clone());
            for col in 0..self.n_samples() {
                let value = self.get(row, col);
                if value.is_nan() {
                    record.push("NA".to_string());
                } else {
                    record.push(value.to_string());
                }
            }
            writer.write_record(&record)?;
        }
        writer.flush()?;

        Ok(())
    }

    /// Get the value at (row, col).
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[(row, col)]
    }

    /// Number of features (rows).
    #[inline]
    pub fn n_features(&self) -> usize {
        self.data.nrows()
    }

    /// Number of samples (columns).
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.data.ncols()
    }

    /// Feature identifiers.
    #[inline]
    pub fn feature_ids(&self) -> &[String] {
        &self.feature_ids
    }

    /// Sample identifiers.
    #[inline]
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Get the underlying dense matrix.
    #[inline]
    pub fn values(&self) -> &DMatrix<f64> {
        &self.data
    }

    /// Values of one feature across samples.
    pub fn row(&self, row: usize) -> Vec<f64> {
        self.data.row(row).iter().copied().collect()
    }

    /// Values of one sample across features.
    pub fn column(&self, col: usize) -> Vec<f64> {
        self.data.column(col).iter().copied().collect()
    }

    /// Sum of all entries. Missing values propagate.
    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    /// Subset the table to include only specified features (by index).
    pub fn subset_features(&self, indices: &[usize]) -> Result<Self> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.n_features()) {
            return Err(MetaboError::InvalidParameter(format!(
                "Feature index {} out of bounds",
                bad
            )));
        }
        let data = self.data.select_rows(indices.iter());
        let feature_ids = indices
            .iter()
            .map(|&i| self.feature_ids[i].clone())
            .collect();
        Self::new(data, feature_ids, self.sample_ids.clone())
    }

    /// Subset the table to include only specified samples (by index).
    pub fn subset_samples(&self, indices: &[usize]) -> Result<Self> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.n_samples()) {
            return Err(MetaboError::InvalidParameter(format!(
                "Sample index {} out of bounds",
                bad
            )));
        }
        let data = self.data.select_columns(indices.iter());
        let sample_ids = indices
            .iter()
            .map(|&i| self.sample_ids[i].clone())
            .collect();
        Self::new(data, self.feature_ids.clone(), sample_ids)
    }

    /// Subset the table to the named samples, in the given order.
    pub fn select_samples(&self, names: &[String]) -> Result<Self> {
        let indices = names
            .iter()
            .map(|name| {
                self.sample_index(name).ok_or_else(|| {
                    MetaboError::SampleMismatch(format!(
                        "Sample '{}' not found in feature table",
                        name
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        self.subset_samples(&indices)
    }

    /// Position of a sample column, if present.
    pub fn sample_index(&self, name: &str) -> Option<usize> {
        self.sample_ids.iter().position(|s| s == name)
    }

    /// Replace the sample identifiers, keeping the values.
    pub fn with_sample_ids(&self, sample_ids: Vec<String>) -> Result<Self> {
        Self::new(self.data.clone(), self.feature_ids.clone(), sample_ids)
    }

    /// Reorder rows and columns. Both orders must be permutations of the axes.
    pub fn permute(&self, row_order: &[usize], col_order: &[usize]) -> Result<Self> {
        check_permutation(row_order, self.n_features())?;
        check_permutation(col_order, self.n_samples())?;
        self.subset_features(row_order)?.subset_samples(col_order)
    }

    /// Swap features and samples. Fails if feature ids repeat, since they
    /// become sample ids.
    pub fn transpose(&self) -> Result<Self> {
        Self::new(
            self.data.transpose(),
            self.sample_ids.clone(),
            self.feature_ids.clone(),
        )
    }
}

impl PartialEq for FeatureTable {
    fn eq(&self, other: &Self) -> bool {
        self.feature_ids == other.feature_ids
            && self.sample_ids == other.sample_ids
            && self.data.shape() == other.data.shape()
            && self
                .data
                .iter()
                .zip(other.data.iter())
                .all(|(a, b)| a == b || (a.is_nan() && b.is_nan()))
    }
}

impl Hash for FeatureTable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.feature_ids.hash(state);
        self.sample_ids.hash(state);
        self.data.shape().hash(state);
        for value in self.data.iter() {
            // all NaNs hash alike
            let bits = if value.is_nan() {
                f64::NAN.to_bits()
            } else {
                value.to_bits()
            };
            bits.hash(state);
        }
    }
}

/// Parse one intensity cell; `None` if the cell is not numeric.
fn parse_intensity(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    match trimmed {
        "" | "NA" | "na" | "NaN" | "nan" => Some(f64::NAN),
        _ => trimmed.parse::<f64>().ok(),
    }
}

fn check_permutation(order: &[usize], len: usize) -> Result<()> {
    if order.len() != len {
        return Err(MetaboError::DimensionMismatch {
            expected: len,
            actual: order.len(),
        });
    }
    let mut seen = vec![false; len];
    for &i in order {
        if i >= len || seen[i] {
            return Err(MetaboError::InvalidParameter(format!(
                "Order is not a permutation of 0..{}",
                len
            )));
        }
        seen[i] = true;
    }
    Ok(())
}
