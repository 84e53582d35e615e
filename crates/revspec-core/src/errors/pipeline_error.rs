//! Pipeline errors and non-fatal error collection.

use std::path::PathBuf;

use super::error_code::{self, RevspecErrorCode};
use super::{ConfigError, ExtractionError, ParseError};

/// Errors that can occur during a batch run.
/// Aggregates subsystem errors via `From` conversions.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Source {path} is {size} bytes, limit is {max}")]
    SourceTooLarge { path: PathBuf, size: u64, max: u64 },

    #[error("Failed to read {path}: {message}")]
    Io { path: PathBuf, message: String },
}

impl RevspecErrorCode for PipelineError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Parse(e) => e.error_code(),
            Self::Extraction(e) => e.error_code(),
            Self::Config(e) => e.error_code(),
            Self::SourceTooLarge { .. } => error_code::SOURCE_TOO_LARGE,
            Self::Io { .. } => error_code::IO_ERROR,
        }
    }
}

/// Result of a pipeline run that accumulates non-fatal errors.
/// Allows partial results to be returned even when some files fail.
#[derive(Debug, Default)]
pub struct PipelineResult<T: Default = ()> {
    /// The successful result data.
    pub data: T,
    /// Non-fatal errors collected during the run, keyed by source file.
    pub errors: Vec<(PathBuf, PipelineError)>,
}

impl<T: Default> PipelineResult<T> {
    /// Create a new pipeline result with no errors.
    pub fn new(data: T) -> Self {
        Self {
            data,
            errors: Vec::new(),
        }
    }

    /// Add a non-fatal error scoped to one file.
    pub fn add_error(&mut self, file: impl Into<PathBuf>, error: impl Into<PipelineError>) {
        self.errors.push((file.into(), error.into()));
    }

    /// Returns true if there are no non-fatal errors.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of non-fatal errors.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }
}
