//! Audit trail: who and when for create, update, and delete.

use revspec_core::constants::DEFAULT_AUDIT_THRESHOLD;

use super::{PatternDetector, PatternKind, PatternVerdict};
use crate::model::CanonicalEntity;

/// Synonym groups; a group counts once however many spellings are present.
pub(crate) const AUDIT_GROUPS: [&[&str]; 6] = [
    &["created_at", "createdAt", "created_on"],
    &["created_by", "createdBy"],
    &["updated_at", "updatedAt", "modified_at"],
    &["updated_by", "updatedBy", "modified_by"],
    DELETED_AT,
    &["deleted_by", "deletedBy"],
];

/// Deleted-at spellings, shared with soft-delete detection.
pub(crate) const DELETED_AT: &[&str] = &["deleted_at", "deletedAt", "removed_at"];

#[derive(Debug, Clone, Copy)]
pub struct AuditTrailDetector {
    threshold: f64,
}

impl Default for AuditTrailDetector {
    fn default() -> Self {
        Self::new(DEFAULT_AUDIT_THRESHOLD)
    }
}

impl AuditTrailDetector {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl PatternDetector for AuditTrailDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::AuditTrail
    }

    /// Confidence is the share of groups present, reported even below the
    /// threshold.
    fn detect(&self, entity: &CanonicalEntity) -> PatternVerdict {
        let mut evidence = Vec::new();
        let mut groups = 0usize;
        for group in AUDIT_GROUPS {
            let present: Vec<&str> = entity
                .field_names()
                .filter(|name| group.iter().any(|s| name.eq_ignore_ascii_case(s)))
                .collect();
            if !present.is_empty() {
                groups += 1;
                evidence.extend(present.into_iter().map(str::to_string));
            }
        }

        let confidence = groups as f64 / AUDIT_GROUPS.len() as f64;
        PatternVerdict {
            pattern: PatternKind::AuditTrail,
            matched: groups > 0 && confidence >= self.threshold,
            evidence_fields: evidence,
            confidence,
        }
    }
}
