//! Distinct values and their frequencies per metadata attribute.

use crate::data::{Metadata, Variable};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Levels of one attribute, most frequent first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeLevels {
    /// Attribute (column) name.
    pub attribute: String,
    /// Distinct non-missing values, stringified.
    pub levels: Vec<String>,
    /// Occurrences of each level, parallel to `levels`.
    pub counts: Vec<usize>,
}

impl AttributeLevels {
    /// Number of distinct levels.
    pub fn n_levels(&self) -> usize {
        self.levels.len()
    }

    /// Occurrences of a given level, 0 if absent.
    pub fn count_of(&self, level: &str) -> usize {
        self.levels
            .iter()
            .position(|l| l == level)
            .map(|i| self.counts[i])
            .unwrap_or(0)
    }
}

/// One `AttributeLevels` entry per metadata column, in column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSummary {
    pub attributes: Vec<AttributeLevels>,
}

impl LevelSummary {
    /// Levels of a named attribute.
    pub fn get(&self, attribute: &str) -> Option<&AttributeLevels> {
        self.attributes.iter().find(|a| a.attribute == attribute)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl std::fmt::Display for LevelSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "ATTRIBUTES\tLEVELS\tCOUNTS")?;
        for attr in &self.attributes {
            let counts: Vec<String> = attr.counts.iter().map(|c| c.to_string()).collect();
            writeln!(
                f,
                "{}\t{{{}}}\t[{}]",
                attr.attribute,
                attr.levels.join(", "),
                counts.join(", ")
            )?;
        }
        Ok(())
    }
}

/// Text form of a level. Numbers keep a decimal point (`1.0`, not `1`) so a
/// numeric column reads the same as a float column rendered as text.
fn level_label(value: &Variable) -> String {
    match value {
        Variable::Continuous(v) => format!("{:?}", v),
        other => other.to_string(),
    }
}

/// Summarize the distinct values of every metadata attribute.
///
/// Missing values are ignored. Levels are ordered by descending count, ties
/// keeping the order in which the values first appear.
pub fn summarize_levels(metadata: &Metadata) -> LevelSummary {
    let attributes = metadata
        .column_names()
        .iter()
        .map(|name| {
            let values = metadata.column(name).unwrap_or(&[]);

            let mut order: Vec<String> = Vec::new();
            let mut counts: HashMap<String, usize> = HashMap::new();
            for value in values.iter().filter(|v| !v.is_missing()) {
                let key = level_label(value);
                let count = counts.entry(key.clone()).or_insert(0);
                if *count == 0 {
                    order.push(key);
                }
                *count += 1;
            }

            // stable: ties keep first-seen order
            order.sort_by(|a, b| counts[b].cmp(&counts[a]));
            let level_counts = order.iter().map(|l| counts[l]).collect();

            AttributeLevels {
                attribute: name.clone(),
                levels: order,
                counts: level_counts,
            }
        })
        .collect();

    LevelSummary { attributes }
}
