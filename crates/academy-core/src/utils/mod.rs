//! Utility functions for string matching and comparison.

pub mod format;

pub use format::{cmp_ignore_case, contains_ignore_case, truncate_string};
