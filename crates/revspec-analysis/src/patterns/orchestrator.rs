//! Runs every enabled detector over an entity and aggregates the verdicts.

use revspec_core::config::PatternConfig;
use serde::{Deserialize, Serialize};

use super::{
    AuditTrailDetector, PatternDetector, PatternKind, PatternVerdict, SoftDeleteDetector, TranslationTableDetector,
    TrinityDetector,
};
use crate::model::CanonicalEntity;

/// Labels and verdicts for one entity.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DetectionResult {
    /// Matched patterns, in [`PatternKind::all`] order.
    pub patterns: Vec<PatternKind>,
    /// One verdict per detector that ran.
    pub verdicts: Vec<PatternVerdict>,
    /// Mean confidence of the matched verdicts; 0.0 when none matched.
    pub confidence: f64,
}

impl DetectionResult {
    fn from_verdicts(verdicts: Vec<PatternVerdict>) -> Self {
        let matched: Vec<&PatternVerdict> = verdicts.iter().filter(|v| v.matched).collect();
        let confidence = if matched.is_empty() {
            0.0
        } else {
            matched.iter().map(|v| v.confidence).sum::<f64>() / matched.len() as f64
        };
        let mut patterns: Vec<PatternKind> = matched.iter().map(|v| v.pattern).collect();
        patterns.sort();
        Self {
            patterns,
            verdicts,
            confidence,
        }
    }

    pub fn has(&self, pattern: PatternKind) -> bool {
        self.patterns.contains(&pattern)
    }

    pub fn verdict(&self, pattern: PatternKind) -> Option<&PatternVerdict> {
        self.verdicts.iter().find(|v| v.pattern == pattern)
    }

    /// Names of the matched patterns.
    pub fn labels(&self) -> Vec<&'static str> {
        self.patterns.iter().map(PatternKind::name).collect()
    }
}

/// The four detectors behind one call.
pub struct PatternOrchestrator {
    detectors: Vec<Box<dyn PatternDetector>>,
}

impl Default for PatternOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PatternOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kinds: Vec<&str> = self.detectors.iter().map(|d| d.kind().name()).collect();
        f.debug_struct("PatternOrchestrator").field("detectors", &kinds).finish()
    }
}

impl PatternOrchestrator {
    /// Every detector with default settings.
    pub fn new() -> Self {
        Self::from_config(&PatternConfig::default())
    }

    /// Detectors named in `config.enabled` (all when empty), with the
    /// configured audit threshold. Unknown names are ignored.
    pub fn from_config(config: &PatternConfig) -> Self {
        let mut detectors: Vec<Box<dyn PatternDetector>> = Vec::with_capacity(PatternKind::all().len());
        for &kind in PatternKind::all() {
            if !config.is_enabled(kind.name()) {
                continue;
            }
            detectors.push(match kind {
                PatternKind::Trinity => Box::new(TrinityDetector),
                PatternKind::AuditTrail => Box::new(AuditTrailDetector::new(config.effective_audit_threshold())),
                PatternKind::SoftDelete => Box::new(SoftDeleteDetector),
                PatternKind::TranslationTable => Box::new(TranslationTableDetector),
            });
        }
        for name in &config.enabled {
            if PatternKind::from_name(name).is_none() {
                tracing::warn!(pattern = %name, "unknown pattern name in config, ignored");
            }
        }
        Self { detectors }
    }

    pub fn kinds(&self) -> Vec<PatternKind> {
        self.detectors.iter().map(|d| d.kind()).collect()
    }

    /// Run every detector. A pure function of `entity`.
    pub fn detect(&self, entity: &CanonicalEntity) -> DetectionResult {
        let verdicts = self.detectors.iter().map(|d| d.detect(entity)).collect();
        let result = DetectionResult::from_verdicts(verdicts);
        tracing::debug!(
            entity = %entity.name,
            patterns = ?result.labels(),
            pattern_confidence = result.confidence,
            "patterns detected"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::test_support::entity;

    #[test]
    fn test_audit_and_soft_delete_average() {
        let post = entity(
            "post",
            &[
                ("title", "TEXT"),
                ("created_at", "TIMESTAMPTZ"),
                ("updated_at", "TIMESTAMPTZ"),
                ("deleted_at", "TIMESTAMPTZ"),
            ],
            &[],
        );
        let result = PatternOrchestrator::new().detect(&post);
        assert_eq!(result.patterns, vec![PatternKind::AuditTrail, PatternKind::SoftDelete]);
        assert!((result.confidence - 0.65).abs() < 1e-9);
        assert_eq!(result.verdicts.len(), 4);
        assert_eq!(result.verdict(PatternKind::AuditTrail).unwrap().confidence, 0.5);
    }

    #[test]
    fn test_no_pattern_is_zero() {
        let note = entity("note", &[("body", "TEXT")], &[]);
        let result = PatternOrchestrator::new().detect(&note);
        assert!(result.patterns.is_empty());
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_enabled_subset() {
        let config = PatternConfig {
            enabled: vec!["soft_delete".to_string(), "versioned".to_string()],
            ..Default::default()
        };
        let orchestrator = PatternOrchestrator::from_config(&config);
        assert_eq!(orchestrator.kinds(), vec![PatternKind::SoftDelete]);

        let user = entity("user", &[("id", "INTEGER"), ("deleted_at", "TIMESTAMPTZ")], &["id"]);
        let result = orchestrator.detect(&user);
        assert_eq!(result.labels(), vec!["soft_delete"]);
        assert!(!result.has(PatternKind::Trinity));
    }

    #[test]
    fn test_field_order_does_not_change_result() {
        let a = entity("t", &[("id", "INTEGER"), ("created_at", "TIMESTAMPTZ"), ("deleted_at", "TIMESTAMPTZ")], &["id"]);
        let b = entity("t", &[("deleted_at", "TIMESTAMPTZ"), ("created_at", "TIMESTAMPTZ"), ("id", "INTEGER")], &["id"]);
        let orchestrator = PatternOrchestrator::new();
        let (ra, rb) = (orchestrator.detect(&a), orchestrator.detect(&b));
        assert_eq!(ra.patterns, rb.patterns);
        assert_eq!(ra.confidence, rb.confidence);
    }
}
