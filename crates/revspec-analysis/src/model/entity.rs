//! Canonical entity.

use std::path::PathBuf;

use revspec_core::errors::ExtractionError;
use serde::{Deserialize, Serialize};

use super::{CanonicalField, ForeignKey};
use crate::language::SourceLanguage;

/// Where a canonical value came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub language: SourceLanguage,
    pub file: PathBuf,
    /// 1-based line of the defining construct.
    pub line: Option<u32>,
}

impl SourceRef {
    pub fn new(language: SourceLanguage, file: impl Into<PathBuf>) -> Self {
        Self {
            language,
            file: file.into(),
            line: None,
        }
    }

    pub fn at_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }
}

/// A named record type with ordered fields and constraints.
///
/// Field names are unique and every primary-key member names an existing
/// field; both are enforced by `push_field` and `set_primary_key`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalEntity {
    /// PascalCase entity name.
    pub name: String,
    pub schema: String,
    pub table_name: String,
    pub description: Option<String>,
    fields: Vec<CanonicalField>,
    primary_key: Option<Vec<String>>,
    pub unique_constraints: Vec<Vec<String>>,
    pub check_constraints: Vec<String>,
    pub foreign_keys: Vec<ForeignKey>,
    pub source: SourceRef,
}

impl CanonicalEntity {
    pub fn new(
        name: impl Into<String>,
        schema: impl Into<String>,
        table_name: impl Into<String>,
        source: SourceRef,
    ) -> Self {
        Self {
            name: name.into(),
            schema: schema.into(),
            table_name: table_name.into(),
            description: None,
            fields: Vec::new(),
            primary_key: None,
            unique_constraints: Vec::new(),
            check_constraints: Vec::new(),
            foreign_keys: Vec::new(),
            source,
        }
    }

    pub fn fields(&self) -> &[CanonicalField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&CanonicalField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut CanonicalField> {
        self.fields.iter_mut().find(|f| f.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Append a field, rejecting a name already present.
    pub fn push_field(&mut self, field: CanonicalField) -> Result<(), ExtractionError> {
        if self.has_field(&field.name) {
            return Err(ExtractionError::DuplicateField {
                entity: self.name.clone(),
                field: field.name,
            });
        }
        self.fields.push(field);
        Ok(())
    }

    pub fn primary_key(&self) -> Option<&[String]> {
        self.primary_key.as_deref()
    }

    /// Set the primary key. Every column must already be a field.
    pub fn set_primary_key(&mut self, columns: Vec<String>) -> Result<(), ExtractionError> {
        if let Some(missing) = columns.iter().find(|c| !self.has_field(c)) {
            return Err(ExtractionError::UnknownPrimaryKeyColumn {
                entity: self.name.clone(),
                column: missing.clone(),
            });
        }
        self.primary_key = (!columns.is_empty()).then_some(columns);
        Ok(())
    }

    pub fn is_primary_key_column(&self, name: &str) -> bool {
        self.primary_key
            .as_ref()
            .is_some_and(|pk| pk.iter().any(|c| c == name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TypeTier;

    fn entity() -> CanonicalEntity {
        CanonicalEntity::new(
            "User",
            "public",
            "users",
            SourceRef::new(SourceLanguage::Sql, "users.sql"),
        )
    }

    fn field(name: &str) -> CanonicalField {
        CanonicalField::new(name, TypeTier::Basic, "integer", "INTEGER", "INTEGER")
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let mut e = entity();
        e.push_field(field("id")).unwrap();
        let err = e.push_field(field("id")).unwrap_err();
        assert!(matches!(err, ExtractionError::DuplicateField { .. }));
        assert_eq!(e.fields().len(), 1);
    }

    #[test]
    fn test_primary_key_must_reference_fields() {
        let mut e = entity();
        e.push_field(field("id")).unwrap();
        assert!(e.set_primary_key(vec!["missing".into()]).is_err());
        assert!(e.primary_key().is_none());
        e.set_primary_key(vec!["id".into()]).unwrap();
        assert!(e.is_primary_key_column("id"));
    }

    #[test]
    fn test_field_order_is_preserved() {
        let mut e = entity();
        for name in ["b", "a", "c"] {
            e.push_field(field(name)).unwrap();
        }
        assert_eq!(e.field_names().collect::<Vec<_>>(), vec!["b", "a", "c"]);
    }
}
