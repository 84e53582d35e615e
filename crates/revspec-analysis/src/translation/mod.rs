//! Translation-table merging.

pub mod merger;

pub use merger::{merge, MergedEntry, MergedFieldMap, TRANSLATIONS_KEY};
pub use crate::patterns::translation_table::parent_table_name;
