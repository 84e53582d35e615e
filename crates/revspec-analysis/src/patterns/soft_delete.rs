//! Soft delete: rows are flagged with a deletion timestamp instead of removed.

use super::audit_trail::DELETED_AT;
use super::{PatternDetector, PatternKind, PatternVerdict};
use crate::model::CanonicalEntity;

const CONFIDENCE: f64 = 0.80;

#[derive(Debug, Default, Clone, Copy)]
pub struct SoftDeleteDetector;

impl PatternDetector for SoftDeleteDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::SoftDelete
    }

    fn detect(&self, entity: &CanonicalEntity) -> PatternVerdict {
        let evidence: Vec<String> = entity
            .field_names()
            .filter(|name| DELETED_AT.iter().any(|s| name.eq_ignore_ascii_case(s)))
            .map(str::to_string)
            .collect();
        if evidence.is_empty() {
            PatternVerdict::unmatched(PatternKind::SoftDelete)
        } else {
            PatternVerdict::matched(PatternKind::SoftDelete, CONFIDENCE, evidence)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::test_support::entity;

    #[test]
    fn test_deleted_at_alone_matches() {
        let order = entity("order", &[("id", "INTEGER"), ("deletedAt", "TIMESTAMPTZ")], &["id"]);
        let verdict = SoftDeleteDetector.detect(&order);
        assert!(verdict.matched);
        assert_eq!(verdict.confidence, 0.80);
        assert_eq!(verdict.evidence_fields, vec!["deletedAt"]);
    }

    #[test]
    fn test_boolean_flag_is_not_soft_delete() {
        let order = entity("order", &[("is_deleted", "BOOLEAN")], &[]);
        assert!(!SoftDeleteDetector.detect(&order).matched);
    }
}
