//! Identity trinity: integer surrogate key, `pk_` UUID, and a text `identifier`.

use super::{PatternDetector, PatternKind, PatternVerdict};
use crate::model::CanonicalEntity;

const CONFIDENCE: f64 = 0.90;

#[derive(Debug, Default, Clone, Copy)]
pub struct TrinityDetector;

impl PatternDetector for TrinityDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::Trinity
    }

    /// Matches on any one marker; every marker present is recorded as evidence.
    fn detect(&self, entity: &CanonicalEntity) -> PatternVerdict {
        let evidence: Vec<String> = entity
            .fields()
            .iter()
            .filter(|f| !f.is_reference())
            .filter(|f| {
                let integer_pk = matches!(f.canonical_type.as_str(), "integer" | "bigint")
                    && entity.is_primary_key_column(&f.name);
                let uuid_pk = f.canonical_type == "uuid" && f.name.starts_with("pk_");
                let identifier = f.canonical_type == "text" && f.name == "identifier";
                integer_pk || uuid_pk || identifier
            })
            .map(|f| f.name.clone())
            .collect();

        if evidence.is_empty() {
            PatternVerdict::unmatched(PatternKind::Trinity)
        } else {
            PatternVerdict::matched(PatternKind::Trinity, CONFIDENCE, evidence)
        }
    }
}
