//! Data structures for metabolomics feature tables and sample metadata.

mod feature_table;
mod metadata;

pub use feature_table::FeatureTable;
pub use metadata::{Metadata, Variable, VariableType};
