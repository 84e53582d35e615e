//! Foreign-key and relationship resolution.
//!
//! SQL `ALTER TABLE` keys are found with one regex over statement text;
//! relation annotations in the AST languages are walked by their extractors
//! and classified here.

pub mod resolver;
pub mod sql_fk;

pub use resolver::{apply_foreign_keys, reference_target_from_suffix, resolve_reference, ReferenceRule};
pub use sql_fk::{foreign_keys_from_tree, foreign_keys_in_alter, split_qualified, TableForeignKey};
