//! Source-unit parse failures.

use std::path::PathBuf;

use super::error_code::{self, RevspecErrorCode};

/// Why a source unit produced no syntax tree. The batch reports it against
/// the unit's path and moves on to the next unit.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// No tree-sitter grammar is linked for the unit's language or extension.
    #[error("No grammar linked for {language}")]
    GrammarNotFound { language: String },

    /// tree-sitter returned no tree at all.
    #[error("Grammar parser produced no tree for {path}: {message}")]
    TreeSitterError { path: PathBuf, message: String },

    /// Malformed input. `line` is the first offending line, 1-based.
    #[error("Syntax error in {path} at line {line}: {message}")]
    Syntax {
        path: PathBuf,
        line: u32,
        message: String,
    },

    #[error("Parse timeout for {path} after {timeout_ms}ms")]
    Timeout { path: PathBuf, timeout_ms: u64 },

    /// Neither the extension nor the content identifies a supported language.
    #[error("No adapter for source with extension {extension:?}")]
    UnsupportedLanguage { extension: String },
}

impl RevspecErrorCode for ParseError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnsupportedLanguage { .. } => error_code::UNSUPPORTED_LANGUAGE,
            Self::Timeout { .. } => error_code::PARSE_TIMEOUT,
            _ => error_code::PARSE_ERROR,
        }
    }
}
