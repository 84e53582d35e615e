//! Translation table: `<parent>_translation` keyed by parent FK and locale.

use super::{PatternDetector, PatternKind, PatternVerdict};
use crate::model::CanonicalEntity;

const CONFIDENCE: f64 = 0.95;
const SUFFIX: &str = "_translation";
const LOCALE_COLUMNS: &[&str] = &["locale", "language", "lang_code", "lang"];

/// The key columns of a structurally valid translation table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationColumns {
    pub fk_column: String,
    pub locale_column: String,
}

/// Parent table name of a translation table: `tb_product_translation` gives
/// `tb_product`.
pub fn parent_table_name(table_name: &str) -> Option<&str> {
    table_name.strip_suffix(SUFFIX).filter(|p| !p.is_empty())
}

/// Key columns when `entity` is a translation table: the name ends in
/// `_translation`, it has an `fk_` column and a locale column, and its primary
/// key is exactly those two.
pub fn translation_columns(entity: &CanonicalEntity) -> Option<TranslationColumns> {
    parent_table_name(&entity.table_name)?;
    let fk_column = entity.field_names().find(|n| n.starts_with("fk_"))?;
    let locale_column = entity.field_names().find(|n| LOCALE_COLUMNS.contains(n))?;
    let pk = entity.primary_key()?;
    let spans = pk.len() == 2 && pk.iter().any(|c| c == fk_column) && pk.iter().any(|c| c == locale_column);
    spans.then(|| TranslationColumns {
        fk_column: fk_column.to_string(),
        locale_column: locale_column.to_string(),
    })
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TranslationTableDetector;

impl PatternDetector for TranslationTableDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::TranslationTable
    }

    fn detect(&self, entity: &CanonicalEntity) -> PatternVerdict {
        match translation_columns(entity) {
            Some(columns) => PatternVerdict::matched(
                PatternKind::TranslationTable,
                CONFIDENCE,
                vec![columns.fk_column, columns.locale_column],
            ),
            None => PatternVerdict::unmatched(PatternKind::TranslationTable),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::test_support::entity;

    fn manufacturer_translation(pk: &[&str]) -> CanonicalEntity {
        entity(
            "tb_manufacturer_translation",
            &[
                ("fk_manufacturer", "INTEGER"),
                ("locale", "TEXT"),
                ("name", "TEXT"),
                ("color_name", "TEXT"),
            ],
            pk,
        )
    }

    #[test]
    fn test_structural_match() {
        let verdict = TranslationTableDetector.detect(&manufacturer_translation(&["fk_manufacturer", "locale"]));
        assert!(verdict.matched);
        assert_eq!(verdict.confidence, 0.95);
        assert_eq!(verdict.evidence_fields, vec!["fk_manufacturer", "locale"]);
    }

    #[test]
    fn test_name_short_circuits() {
        let mut table = manufacturer_translation(&["fk_manufacturer", "locale"]);
        table.table_name = "tb_manufacturer_i18n".to_string();
        assert!(!TranslationTableDetector.detect(&table).matched);
    }

    #[test]
    fn test_primary_key_must_span_exactly_fk_and_locale() {
        assert!(translation_columns(&manufacturer_translation(&["fk_manufacturer"])).is_none());
        assert!(translation_columns(&manufacturer_translation(&["fk_manufacturer", "locale", "name"])).is_none());
        assert!(translation_columns(&manufacturer_translation(&["fk_manufacturer", "name"])).is_none());
    }

    #[test]
    fn test_alternate_locale_spellings() {
        let table = entity(
            "page_translation",
            &[("fk_page", "INTEGER"), ("lang_code", "TEXT"), ("title", "TEXT")],
            &["lang_code", "fk_page"],
        );
        let columns = translation_columns(&table).unwrap();
        assert_eq!(columns.locale_column, "lang_code");
        assert_eq!(parent_table_name(&table.table_name), Some("page"));
    }
}
