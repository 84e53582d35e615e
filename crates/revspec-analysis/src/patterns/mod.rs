//! Design-pattern detection over canonical entities.
//!
//! Four detectors, each a pure function of one entity, aggregated by the
//! [`PatternOrchestrator`].

pub mod audit_trail;
pub mod orchestrator;
pub mod soft_delete;
pub mod translation_table;
pub mod trinity;

pub use audit_trail::AuditTrailDetector;
pub use orchestrator::{DetectionResult, PatternOrchestrator};
pub use soft_delete::SoftDeleteDetector;
pub use translation_table::{translation_columns, TranslationColumns, TranslationTableDetector};
pub use trinity::TrinityDetector;

use serde::{Deserialize, Serialize};

use crate::model::CanonicalEntity;

/// The recognised entity-level design patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    /// Integer id, `pk_` UUID and text `identifier` side by side.
    Trinity,
    AuditTrail,
    SoftDelete,
    TranslationTable,
}

impl PatternKind {
    pub fn all() -> &'static [PatternKind] {
        &[
            Self::Trinity,
            Self::AuditTrail,
            Self::SoftDelete,
            Self::TranslationTable,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Trinity => "trinity",
            Self::AuditTrail => "audit_trail",
            Self::SoftDelete => "soft_delete",
            Self::TranslationTable => "translation_table",
        }
    }

    pub fn from_name(name: &str) -> Option<PatternKind> {
        Self::all().iter().copied().find(|k| k.name() == name)
    }
}

/// One detector's judgement on one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternVerdict {
    pub pattern: PatternKind,
    pub matched: bool,
    /// Field names that supported the verdict.
    pub evidence_fields: Vec<String>,
    pub confidence: f64,
}

impl PatternVerdict {
    pub fn matched(pattern: PatternKind, confidence: f64, evidence_fields: Vec<String>) -> Self {
        Self {
            pattern,
            matched: true,
            evidence_fields,
            confidence,
        }
    }

    pub fn unmatched(pattern: PatternKind) -> Self {
        Self {
            pattern,
            matched: false,
            evidence_fields: Vec::new(),
            confidence: 0.0,
        }
    }
}

/// Trait implemented by every pattern detector.
///
/// Detection is total: every entity gets a verdict, never an error.
pub trait PatternDetector: Send + Sync {
    /// The pattern this detector recognises.
    fn kind(&self) -> PatternKind;

    /// Judge one entity.
    fn detect(&self, entity: &CanonicalEntity) -> PatternVerdict;
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::extractors::type_map::{make_field, sql_type};
    use crate::language::SourceLanguage;
    use crate::model::{CanonicalEntity, SourceRef};

    /// Build an entity from `(name, sql type)` columns and a primary key.
    pub fn entity(table: &str, columns: &[(&str, &str)], pk: &[&str]) -> CanonicalEntity {
        let mut entity = CanonicalEntity::new(
            crate::extractors::naming::entity_name(table),
            "public",
            table,
            SourceRef::new(SourceLanguage::Sql, "schema.sql"),
        );
        for (name, native) in columns {
            let (ty, is_array) = sql_type(native);
            let field = make_field(name, native, ty)
                .with_list(is_array)
                .with_nullable(!pk.contains(name));
            entity.push_field(field).unwrap();
        }
        entity
            .set_primary_key(pk.iter().map(|c| c.to_string()).collect())
            .unwrap();
        entity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_names_round_trip() {
        for &kind in PatternKind::all() {
            assert_eq!(PatternKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(PatternKind::from_name("versioned"), None);
    }

    #[test]
    fn test_kind_serializes_as_name() {
        let json = serde_json::to_string(&PatternKind::AuditTrail).unwrap();
        assert_eq!(json, "\"audit_trail\"");
    }
}
