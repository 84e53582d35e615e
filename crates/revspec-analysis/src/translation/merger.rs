//! Fold a translation table into its parent's field map.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::model::CanonicalEntity;
use crate::patterns::translation_columns;

/// Key under which translatable fields are nested.
pub const TRANSLATIONS_KEY: &str = "translations";

/// Type expression of the nested locale entry.
const LOCALE_REFERENCE: &str = "ref(Locale)";

/// One entry of a field map: a type expression or a nested map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergedEntry {
    Type(String),
    Nested(Vec<(String, String)>),
}

/// Ordered field name to type expression map, possibly with a nested
/// `translations` entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MergedFieldMap {
    entries: Vec<(String, MergedEntry)>,
}

impl MergedFieldMap {
    /// The entity's own fields, in declaration order.
    pub fn from_entity(entity: &CanonicalEntity) -> Self {
        Self {
            entries: entity
                .fields()
                .iter()
                .map(|f| (f.name.clone(), MergedEntry::Type(f.type_expression())))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&MergedEntry> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, e)| e)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn entries(&self) -> &[(String, MergedEntry)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The nested translations, if merged.
    pub fn translations(&self) -> Option<&[(String, String)]> {
        match self.get(TRANSLATIONS_KEY)? {
            MergedEntry::Nested(nested) => Some(nested),
            MergedEntry::Type(_) => None,
        }
    }

    /// Ordered JSON object form.
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .entries
            .iter()
            .map(|(name, entry)| {
                let value = match entry {
                    MergedEntry::Type(expr) => serde_json::Value::String(expr.clone()),
                    MergedEntry::Nested(nested) => serde_json::Value::Object(
                        nested
                            .iter()
                            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                            .collect(),
                    ),
                };
                (name.clone(), value)
            })
            .collect();
        serde_json::Value::Object(map)
    }
}

impl Serialize for MergedEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Type(expr) => serializer.serialize_str(expr),
            Self::Nested(nested) => {
                let mut map = serializer.serialize_map(Some(nested.len()))?;
                for (k, v) in nested {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl Serialize for MergedFieldMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, entry) in &self.entries {
            map.serialize_entry(name, entry)?;
        }
        map.end()
    }
}

/// Merge `translation` into `parent`.
///
/// The translatable fields (every translation field except its FK and
/// locale columns) move under `translations` together with
/// `locale: ref(Locale)`, and same-named parent fields are dropped. When
/// `translation` is not a structurally valid translation table the result is
/// the parent's own field map. Neither input is modified.
pub fn merge(parent: &CanonicalEntity, translation: &CanonicalEntity) -> MergedFieldMap {
    let Some(columns) = translation_columns(translation) else {
        tracing::debug!(
            parent = %parent.name,
            translation = %translation.table_name,
            "not a translation table, parent fields kept as is"
        );
        return MergedFieldMap::from_entity(parent);
    };

    let translatable: Vec<(String, String)> = translation
        .fields()
        .iter()
        .filter(|f| f.name != columns.fk_column && f.name != columns.locale_column)
        .map(|f| (f.name.clone(), f.type_expression()))
        .collect();

    let mut nested = Vec::with_capacity(translatable.len() + 1);
    nested.push(("locale".to_string(), LOCALE_REFERENCE.to_string()));
    nested.extend(translatable.iter().filter(|(name, _)| name != "locale").cloned());

    let mut entries: Vec<(String, MergedEntry)> = parent
        .fields()
        .iter()
        .filter(|f| !translatable.iter().any(|(name, _)| *name == f.name) && f.name != TRANSLATIONS_KEY)
        .map(|f| (f.name.clone(), MergedEntry::Type(f.type_expression())))
        .collect();
    entries.push((TRANSLATIONS_KEY.to_string(), MergedEntry::Nested(nested)));
    MergedFieldMap { entries }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::test_support::entity;

    fn manufacturer() -> CanonicalEntity {
        entity(
            "tb_manufacturer",
            &[("pk_manufacturer", "UUID"), ("name", "TEXT"), ("color_name", "TEXT")],
            &["pk_manufacturer"],
        )
    }

    fn manufacturer_translation() -> CanonicalEntity {
        entity(
            "tb_manufacturer_translation",
            &[
                ("fk_manufacturer", "UUID"),
                ("locale", "TEXT"),
                ("name", "TEXT"),
                ("color_name", "TEXT"),
            ],
            &["fk_manufacturer", "locale"],
        )
    }

    #[test]
    fn test_merge_nests_translatable_fields() {
        let merged = merge(&manufacturer(), &manufacturer_translation());
        assert_eq!(merged.names().collect::<Vec<_>>(), vec!["pk_manufacturer", "translations"]);
        assert_eq!(
            merged.translations().unwrap(),
            &[
                ("locale".to_string(), "ref(Locale)".to_string()),
                ("name".to_string(), "text".to_string()),
                ("color_name".to_string(), "text".to_string()),
            ]
        );
    }

    #[test]
    fn test_merge_degrades_to_parent_fields() {
        let mut not_translation = manufacturer_translation();
        not_translation.set_primary_key(vec!["fk_manufacturer".to_string()]).unwrap();
        let parent = manufacturer();
        let merged = merge(&parent, &not_translation);
        assert_eq!(merged, MergedFieldMap::from_entity(&parent));
        assert!(merged.translations().is_none());
    }

    #[test]
    fn test_merge_leaves_inputs_untouched() {
        let parent = manufacturer();
        let translation = manufacturer_translation();
        let (before_parent, before_translation) = (parent.clone(), translation.clone());
        let _ = merge(&parent, &translation);
        assert_eq!(parent, before_parent);
        assert_eq!(translation, before_translation);
    }

    #[test]
    fn test_serializes_nested_map_in_order() {
        let merged = merge(&manufacturer(), &manufacturer_translation());
        let json = serde_json::to_string(&merged).unwrap();
        assert_eq!(
            json,
            r#"{"pk_manufacturer":"uuid!","translations":{"locale":"ref(Locale)","name":"text","color_name":"text"}}"#
        );
        assert_eq!(serde_json::to_string(&merged.to_json()).unwrap(), json);
    }
}
