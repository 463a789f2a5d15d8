//! Filtering primitives for feature tables.

pub mod blank;

pub use blank::{
    filter_blanks, row_means, split_by_attribute, BlankFilterResult, DEFAULT_BLANK_CUTOFF,
};
