//! RevspecErrorCode trait for structured error reporting.

/// Trait for attaching a stable machine-readable code to revspec errors.
/// Every error enum implements this so callers can group failures
/// without matching on message text.
pub trait RevspecErrorCode {
    /// Returns the error code string (e.g., "PARSE_ERROR").
    fn error_code(&self) -> &'static str;

    /// Returns the formatted diagnostic string: `[ERROR_CODE] message`.
    fn coded_string(&self) -> String
    where
        Self: std::fmt::Display,
    {
        format!("[{}] {}", self.error_code(), self)
    }
}

pub const PARSE_ERROR: &str = "PARSE_ERROR";
pub const PARSE_TIMEOUT: &str = "PARSE_TIMEOUT";
pub const UNSUPPORTED_LANGUAGE: &str = "UNSUPPORTED_LANGUAGE";
pub const UNSUPPORTED_CONSTRUCT: &str = "UNSUPPORTED_CONSTRUCT";
pub const EXTRACTION_ERROR: &str = "EXTRACTION_ERROR";
pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const SOURCE_TOO_LARGE: &str = "SOURCE_TOO_LARGE";
pub const IO_ERROR: &str = "IO_ERROR";
