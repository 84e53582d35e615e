//! Extraction errors.

use super::error_code::{self, RevspecErrorCode};

/// Conditions raised while mapping a syntax tree onto the canonical model.
///
/// Extractors record these as diagnostics and keep going: an
/// `UnsupportedConstruct` skips one construct, never the whole file.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExtractionError {
    #[error("Unsupported {construct} at line {line}: {reason}")]
    UnsupportedConstruct {
        construct: String,
        line: u32,
        reason: String,
    },

    #[error("Duplicate field {field} in {entity}")]
    DuplicateField { entity: String, field: String },

    #[error("Primary key column {column} not found in {entity}")]
    UnknownPrimaryKeyColumn { entity: String, column: String },

    #[error("Translation table {table} left standalone: {parent} already merges {merged}")]
    UnpairedTranslation {
        table: String,
        parent: String,
        merged: String,
    },
}

impl RevspecErrorCode for ExtractionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnsupportedConstruct { .. } => error_code::UNSUPPORTED_CONSTRUCT,
            _ => error_code::EXTRACTION_ERROR,
        }
    }
}
