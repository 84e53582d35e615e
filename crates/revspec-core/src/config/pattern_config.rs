//! Pattern detection configuration.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_AUDIT_THRESHOLD, DEFAULT_MIN_PATTERN_CONFIDENCE};

/// Configuration for the pattern orchestrator and its reporting.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PatternConfig {
    /// Entities below this aggregate confidence are flagged. Default: 0.80.
    pub min_confidence: Option<f64>,
    /// Audit-trail match threshold as a share of synonym groups. Default: 0.50.
    pub audit_threshold: Option<f64>,
    /// Pattern names to run. Empty means all.
    #[serde(default)]
    pub enabled: Vec<String>,
}

impl PatternConfig {
    /// Returns the effective reporting threshold, defaulting to 0.80.
    pub fn effective_min_confidence(&self) -> f64 {
        self.min_confidence.unwrap_or(DEFAULT_MIN_PATTERN_CONFIDENCE)
    }

    /// Returns the effective audit threshold, defaulting to 0.50.
    pub fn effective_audit_threshold(&self) -> f64 {
        self.audit_threshold.unwrap_or(DEFAULT_AUDIT_THRESHOLD)
    }

    /// Whether the named pattern should run.
    pub fn is_enabled(&self, pattern: &str) -> bool {
        self.enabled.is_empty() || self.enabled.iter().any(|p| p == pattern)
    }
}
