//! Structured log events for key extraction operations.
//!
//! Each function emits a `tracing` event with structured fields.

use std::path::Path;

/// Log a construct the extractor recognised syntactically but skipped.
pub fn construct_skipped(path: &Path, construct: &str, line: u32, reason: &str) {
    tracing::debug!(
        event = "construct_skipped",
        path = %path.display(),
        construct = %construct,
        line = line,
        reason = %reason,
        "unsupported construct skipped"
    );
}

/// Log a candidate dropped below the confidence floor.
pub fn low_confidence_omission(path: &Path, candidate: &str, confidence: f64, floor: f64) {
    tracing::debug!(
        event = "low_confidence_omission",
        path = %path.display(),
        candidate = %candidate,
        confidence = confidence,
        floor = floor,
        "candidate omitted below confidence floor"
    );
}

/// Log a per-file failure caught at the batch boundary.
pub fn file_failed(path: &Path, code: &str, error: &dyn std::fmt::Display) {
    tracing::warn!(
        event = "file_failed",
        path = %path.display(),
        code = code,
        error = %error,
        "source unit failed"
    );
}

/// Log an entity whose aggregate pattern confidence is under the reporting threshold.
pub fn low_pattern_confidence(entity: &str, confidence: f64, threshold: f64) {
    tracing::debug!(
        event = "low_pattern_confidence",
        entity = %entity,
        pattern_confidence = confidence,
        threshold = threshold,
        "entity below pattern confidence threshold"
    );
}

/// Log a batch completion summary.
pub fn batch_completed(
    files: usize,
    entities: usize,
    actions: usize,
    errors: usize,
    omissions: usize,
    duration_ms: u64,
) {
    tracing::info!(
        event = "batch_completed",
        files = files,
        entities_extracted = entities,
        actions_extracted = actions,
        errors = errors,
        low_confidence_omissions = omissions,
        batch_duration_ms = duration_ms,
        "batch completed"
    );
}
