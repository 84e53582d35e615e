//! Reference classification and foreign-key application.

use super::sql_fk::TableForeignKey;
use crate::extractors::naming::entity_name;
use crate::extractors::ExtractionContext;
use crate::model::{CanonicalEntity, CanonicalField};

/// Which rule classified a field as a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceRule {
    /// Foreign-key constraint or relation annotation.
    Explicit,
    /// Native type names a known entity.
    KnownEntity,
    /// `_id` / `Id` naming convention.
    NameSuffix,
}

/// Target entity implied by an `_id` / `Id` suffix: `owner_id` and `ownerId`
/// both give `Owner`.
pub fn reference_target_from_suffix(field_name: &str) -> Option<String> {
    let stem = field_name
        .strip_suffix("_id")
        .or_else(|| field_name.strip_suffix("_ID"))
        .or_else(|| {
            // camelCase only: `paid` must not match.
            let stem = field_name.strip_suffix("Id")?;
            stem.chars()
                .last()
                .is_some_and(|c| c.is_lowercase() || c.is_ascii_digit())
                .then_some(stem)
        })?;
    (!stem.is_empty()).then(|| entity_name(stem))
}

/// Classify a field as a reference, first rule wins:
/// an explicit annotation, a native type naming a known entity, then the
/// name suffix. Primary-key members never take the suffix rule.
pub fn resolve_reference(
    field: &mut CanonicalField,
    explicit: Option<&str>,
    ctx: &ExtractionContext,
    is_primary_key: bool,
) -> Option<ReferenceRule> {
    if let Some(target) = explicit.filter(|t| !t.is_empty()) {
        field.set_reference(target);
        return Some(ReferenceRule::Explicit);
    }
    if let Some(target) = ctx.resolve_entity(&field.native_type) {
        field.set_reference(target.to_string());
        return Some(ReferenceRule::KnownEntity);
    }
    if is_primary_key {
        return None;
    }
    let target = reference_target_from_suffix(&field.name)?;
    field.set_reference(target);
    Some(ReferenceRule::NameSuffix)
}

fn owns(entity: &CanonicalEntity, fk: &TableForeignKey) -> bool {
    entity.table_name == fk.table
        && fk
            .schema
            .as_deref()
            .map_or(true, |schema| schema == entity.schema)
}

/// Attach table-level foreign keys to their owning entities. The source
/// column becomes a reference to the FK's target entity, overriding any
/// suffix-based guess. Keys already present are not duplicated.
///
/// Returns the number of keys that found an owning entity.
pub fn apply_foreign_keys(entities: &mut [CanonicalEntity], fks: &[TableForeignKey]) -> usize {
    let mut applied = 0;
    for fk in fks {
        let Some(entity) = entities.iter_mut().find(|e| owns(e, fk)) else {
            tracing::debug!(
                table = %fk.table,
                column = %fk.foreign_key.source_column,
                "foreign key has no owning entity in this batch"
            );
            continue;
        };
        applied += 1;

        let fk_data = &fk.foreign_key;
        let duplicate = entity.foreign_keys.iter().any(|existing| {
            existing.source_column == fk_data.source_column
                && existing.target_table == fk_data.target_table
        });
        if !duplicate {
            entity.foreign_keys.push(fk_data.clone());
        }
        if let Some(field) = entity.field_mut(&fk_data.source_column) {
            field.set_reference(fk_data.target_entity.clone());
        }
    }
    applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::SourceLanguage;
    use crate::model::{ForeignKey, SourceRef, TypeTier};

    fn int_field(name: &str) -> CanonicalField {
        CanonicalField::new(name, TypeTier::Basic, "integer", "INTEGER", "INTEGER")
    }

    fn ctx() -> ExtractionContext {
        ExtractionContext::new("x.sql", SourceLanguage::Sql).with_known_entities(["Author"])
    }

    #[test]
    fn test_suffix_targets() {
        assert_eq!(reference_target_from_suffix("owner_id").as_deref(), Some("Owner"));
        assert_eq!(reference_target_from_suffix("authorId").as_deref(), Some("Author"));
        assert_eq!(reference_target_from_suffix("paid"), None);
        assert_eq!(reference_target_from_suffix("_id"), None);
        assert_eq!(reference_target_from_suffix("name"), None);
    }

    #[test]
    fn test_explicit_beats_suffix() {
        let mut field = int_field("owner_id");
        let rule = resolve_reference(&mut field, Some("Organization"), &ctx(), false);
        assert_eq!(rule, Some(ReferenceRule::Explicit));
        assert_eq!(field.type_expression(), "ref(Organization)");
    }

    #[test]
    fn test_known_entity_beats_suffix() {
        let mut field = CanonicalField::new("writer_id", TypeTier::Basic, "text", "Author", "TEXT");
        assert_eq!(
            resolve_reference(&mut field, None, &ctx(), false),
            Some(ReferenceRule::KnownEntity)
        );
        assert_eq!(field.reference_target.as_deref(), Some("Author"));
    }

    #[test]
    fn test_primary_key_skips_suffix_rule() {
        let mut field = int_field("user_id");
        assert_eq!(resolve_reference(&mut field, None, &ctx(), true), None);
        assert_eq!(field.type_tier, TypeTier::Basic);
    }

    #[test]
    fn test_apply_foreign_keys_is_idempotent() {
        let mut entity = CanonicalEntity::new(
            "Manufacturer",
            "catalog",
            "tb_manufacturer",
            SourceRef::new(SourceLanguage::Sql, "m.sql"),
        );
        entity.push_field(int_field("fk_company")).unwrap();
        let fk = TableForeignKey {
            schema: Some("catalog".into()),
            table: "tb_manufacturer".into(),
            foreign_key: ForeignKey::new("fk_company", "tb_organization", "Organization"),
        };
        let mut entities = vec![entity];
        assert_eq!(apply_foreign_keys(&mut entities, &[fk.clone()]), 1);
        assert_eq!(apply_foreign_keys(&mut entities, &[fk]), 1);
        assert_eq!(entities[0].foreign_keys.len(), 1);
        assert_eq!(
            entities[0].field("fk_company").unwrap().type_expression(),
            "ref(Organization)"
        );
    }
}
