//! # revspec-core
//!
//! Foundation crate for the revspec reverse-engineering engine.
//! Defines errors, config, tracing setup, and shared constants.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod tracing;

// Re-export the most commonly used types at the crate root.
pub use config::RevspecConfig;
pub use errors::error_code::RevspecErrorCode;
pub use rustc_hash::{FxHashMap, FxHashSet};
