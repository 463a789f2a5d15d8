//! Sample metadata handling.

use crate::error::{MetaboError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::Path;

/// A metadata cell: free text, a number, or missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Variable {
    /// Free-text value.
    Categorical(String),
    /// Continuous numeric variable.
    Continuous(f64),
    /// Missing value.
    Missing,
}

impl Variable {
    /// Check if this is a missing value.
    pub fn is_missing(&self) -> bool {
        matches!(self, Variable::Missing)
    }

    /// Try to get as categorical string.
    pub fn as_categorical(&self) -> Option<&str> {
        match self {
            Variable::Categorical(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as continuous f64.
    pub fn as_continuous(&self) -> Option<f64> {
        match self {
            Variable::Continuous(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variable::Categorical(s) => write!(f, "{}", s),
            Variable::Continuous(v) => write!(f, "{}", v),
            Variable::Missing => write!(f, "NA"),
        }
    }
}

impl Hash for Variable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Variable::Categorical(s) => s.hash(state),
            Variable::Continuous(v) => v.to_bits().hash(state),
            Variable::Missing => {}
        }
    }
}

/// Inferred kind of a metadata column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VariableType {
    Categorical,
    Continuous,
}

/// Sample metadata: one row per sample, one column per attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    /// Sample IDs in order.
    sample_ids: Vec<String>,
    /// Column names.
    column_names: Vec<String>,
    /// Values per column, aligned with `sample_ids`.
    columns: Vec<Vec<Variable>>,
    /// Inferred kind of each column.
    column_types: Vec<VariableType>,
    /// Sample ID -> row position.
    index: HashMap<String, usize>,
}

impl Metadata {
    /// Create empty metadata.
    pub fn new() -> Self {
        Self {
            sample_ids: Vec::new(),
            column_names: Vec::new(),
            columns: Vec::new(),
            column_types: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Build metadata from named columns, inferring column types from the values.
    ///
    /// A column holding any categorical value is categorical; anything else is
    /// continuous.
    pub fn from_columns(
        sample_ids: Vec<String>,
        columns: Vec<(String, Vec<Variable>)>,
    ) -> Result<Self> {
        let mut column_names = Vec::with_capacity(columns.len());
        let mut values = Vec::with_capacity(columns.len());
        let mut column_types = Vec::with_capacity(columns.len());

        for (name, column) in columns {
            if column.len() != sample_ids.len() {
                return Err(MetaboError::DimensionMismatch {
                    expected: sample_ids.len(),
                    actual: column.len(),
                });
            }
            if column_names.contains(&name) {
                return Err(MetaboError::DuplicateId(name));
            }
            column_types.push(infer_type(&column));
            column_names.push(name);
            values.push(column);
        }

        Self::from_parts(sample_ids, column_names, values, column_types)
    }

    fn from_parts(
        sample_ids: Vec<String>,
        column_names: Vec<String>,
        columns: Vec<Vec<Variable>>,
        column_types: Vec<VariableType>,
    ) -> Result<Self> {
        let mut index = HashMap::with_capacity(sample_ids.len());
        for (pos, sid) in sample_ids.iter().enumerate() {
            if index.insert(sid.clone(), pos).is_some() {
                return Err(MetaboError::DuplicateId(sid.clone()));
            }
        }
        Ok(Self {
            sample_ids,
            column_names,
            columns,
            column_types,
            index,
        })
    }

    /// Load metadata from a TSV file.
    ///
    /// Expected format:
    /// - First row: header with column names (first column is sample ID)
    /// - Subsequent rows: sample ID followed by variable values
    ///
    /// Columns are inferred as continuous if all values parse as numbers,
    /// otherwise categorical.
    /// Sample IDs and categorical values are kept verbatim (untrimmed);
    /// see `clean::normalize_metadata`.
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .flexible(true)
            .from_path(path)?;

        let header: Vec<String> = reader.headers()?.iter().map(String::from).collect();
        if header.len() < 2 {
            return Err(MetaboError::EmptyData(
                "Metadata must have at least one variable column".to_string(),
            ));
        }
        let column_names: Vec<String> = header[1..].to_vec();

        // First pass: collect raw values to infer types
        let mut raw_data: Vec<(String, Vec<String>)> = Vec::new();
        for record in reader.records() {
            let record = record?;
            if record.iter().all(|field| field.trim().is_empty()) {
                continue;
            }
            let sample_id = record.get(0).unwrap_or_default().to_string();
            let values = record.iter().skip(1).map(String::from).collect();
            raw_data.push((sample_id, values));
        }

        if raw_data.is_empty() {
            return Err(MetaboError::EmptyData("No samples in metadata".to_string()));
        }

        let mut columns = Vec::with_capacity(column_names.len());
        let mut column_types = Vec::with_capacity(column_names.len());
        for col_idx in 0..column_names.len() {
            let all_numeric = raw_data.iter().all(|(_, values)| {
                values
                    .get(col_idx)
                    .map(|v| is_missing_token(v) || v.trim().parse::<f64>().is_ok())
                    .unwrap_or(true)
            });
            let var_type = if all_numeric {
                VariableType::Continuous
            } else {
                VariableType::Categorical
            };

            let column = raw_data
                .iter()
                .map(|(_, values)| match values.get(col_idx) {
                    Some(raw) if !is_missing_token(raw) => parse_variable(raw, var_type),
                    _ => Variable::Missing,
                })
                .collect();
            columns.push(column);
            column_types.push(var_type);
        }

        let sample_ids = raw_data.into_iter().map(|(sid, _)| sid).collect();
        Self::from_parts(sample_ids, column_names, columns, column_types)
    }

    /// Sample IDs in order.
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Column names.
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Number of samples.
    pub fn n_samples(&self) -> usize {
        self.sample_ids.len()
    }

    /// Number of columns (variables).
    pub fn n_columns(&self) -> usize {
        self.column_names.len()
    }

    /// Get a variable value for a specific sample and column.
    pub fn get(&self, sample_id: &str, column: &str) -> Option<&Variable> {
        let row = *self.index.get(sample_id)?;
        let col = self.column_position(column)?;
        self.columns[col].get(row)
    }

    /// Get all values for a column, in sample order.
    pub fn column(&self, column: &str) -> Result<&[Variable]> {
        self.column_position(column)
            .map(|col| self.columns[col].as_slice())
            .ok_or_else(|| MetaboError::MissingColumn(column.to_string()))
    }

    /// Get the type of a column.
    pub fn column_type(&self, column: &str) -> Option<VariableType> {
        self.column_position(column).map(|col| self.column_types[col])
    }

    /// Subset metadata to only include specified samples, in the given order.
    pub fn subset_samples(&self, sample_ids: &[String]) -> Result<Self> {
        let rows = sample_ids
            .iter()
            .map(|sid| {
                self.index.get(sid).copied().ok_or_else(|| {
                    MetaboError::SampleMismatch(format!("Sample '{}' not found in metadata", sid))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let columns = self
            .columns
            .iter()
            .map(|column| rows.iter().map(|&row| column[row].clone()).collect())
            .collect();

        Self::from_parts(
            sample_ids.to_vec(),
            self.column_names.clone(),
            columns,
            self.column_types.clone(),
        )
    }

    /// Replace the sample IDs, keeping row order. IDs must stay unique.
    pub fn with_sample_ids(&self, sample_ids: Vec<String>) -> Result<Self> {
        if sample_ids.len() != self.n_samples() {
            return Err(MetaboError::DimensionMismatch {
                expected: self.n_samples(),
                actual: sample_ids.len(),
            });
        }
        Self::from_parts(
            sample_ids,
            self.column_names.clone(),
            self.columns.clone(),
            self.column_types.clone(),
        )
    }

    /// Apply `f` to every categorical value; other values pass through.
    pub fn map_categorical<F>(&self, f: F) -> Self
    where
        F: Fn(&str) -> String,
    {
        let mut mapped = self.clone();
        for column in mapped.columns.iter_mut() {
            for var in column.iter_mut() {
                if let Variable::Categorical(s) = var {
                    *s = f(s);
                }
            }
        }
        mapped
    }

    /// Check if a column exists.
    pub fn has_column(&self, column: &str) -> bool {
        self.column_position(column).is_some()
    }

    fn column_position(&self, column: &str) -> Option<usize> {
        self.column_names.iter().position(|c| c == column)
    }
}

impl Default for Metadata {
    fn default() -> Self {
        Self::new()
    }
}

impl Hash for Metadata {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.sample_ids.hash(state);
        self.column_names.hash(state);
        self.column_types.hash(state);
        self.columns.hash(state);
    }
}

fn is_missing_token(raw: &str) -> bool {
    matches!(raw.trim(), "" | "NA" | "na" | "NaN" | "nan")
}

fn parse_variable(raw: &str, var_type: VariableType) -> Variable {
    let trimmed = raw.trim();
    match var_type {
        VariableType::Continuous => trimmed
            .parse::<f64>()
            .map(Variable::Continuous)
            .unwrap_or(Variable::Missing),
        VariableType::Categorical => Variable::Categorical(raw.to_string()),
    }
}

fn infer_type(column: &[Variable]) -> VariableType {
    if column.iter().any(|v| v.as_categorical().is_some()) {
        VariableType::Categorical
    } else {
        VariableType::Continuous
    }
}
