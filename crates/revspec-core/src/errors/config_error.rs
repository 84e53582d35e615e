//! `revspec.toml` loading and validation errors.

use super::error_code::{self, RevspecErrorCode};

/// Raised while resolving the layered configuration. Any of these aborts the
/// run before a single source unit is read.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("revspec config not readable at {path}")]
    FileNotFound { path: String },

    /// The TOML itself is malformed or has a mistyped key.
    #[error("Malformed revspec config {path}: {message}")]
    ParseError { path: String, message: String },

    /// Well-formed TOML with an out-of-range value, e.g. a confidence
    /// threshold above 1.0 or a zero parse budget.
    #[error("Invalid setting {field}: {message}")]
    ValidationFailed { field: String, message: String },
}

impl RevspecErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        error_code::CONFIG_ERROR
    }
}
