//! Per-unit extraction state threaded through every extractor.

use std::path::{Path, PathBuf};

use revspec_core::constants::{DEFAULT_CONFIDENCE_FLOOR, DEFAULT_SCHEMA};
use revspec_core::errors::ExtractionError;
use revspec_core::tracing::events;
use revspec_core::FxHashMap;

use crate::language::SourceLanguage;
use crate::model::SourceRef;

/// Mutable state for extracting one source unit.
///
/// A context is created per unit and never shared between units.
#[derive(Debug, Clone)]
pub struct ExtractionContext {
    path: PathBuf,
    language: SourceLanguage,
    confidence_floor: f64,
    default_schema: String,
    /// Names that denote an entity, mapped to the entity name they resolve
    /// to (`UserEntity` to `User`). Used for reference classification.
    known_entities: FxHashMap<String, String>,
    /// Enum name to its values, in declaration order.
    enums: FxHashMap<String, Vec<String>>,
    diagnostics: Vec<ExtractionError>,
    omissions: usize,
}

impl ExtractionContext {
    pub fn new(path: impl Into<PathBuf>, language: SourceLanguage) -> Self {
        Self {
            path: path.into(),
            language,
            confidence_floor: DEFAULT_CONFIDENCE_FLOOR,
            default_schema: DEFAULT_SCHEMA.to_string(),
            known_entities: FxHashMap::default(),
            enums: FxHashMap::default(),
            diagnostics: Vec::new(),
            omissions: 0,
        }
    }

    pub fn with_confidence_floor(mut self, floor: f64) -> Self {
        self.confidence_floor = floor;
        self
    }

    pub fn with_default_schema(mut self, schema: impl Into<String>) -> Self {
        self.default_schema = schema.into();
        self
    }

    /// Seed entity names known from other units.
    pub fn with_known_entities<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            self.register_entity(name);
        }
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn language(&self) -> SourceLanguage {
        self.language
    }

    pub fn confidence_floor(&self) -> f64 {
        self.confidence_floor
    }

    pub fn default_schema(&self) -> &str {
        &self.default_schema
    }

    /// Provenance for a construct at `line` in this unit.
    pub fn source_at(&self, line: u32) -> SourceRef {
        SourceRef::new(self.language, self.path.clone()).at_line(line)
    }

    pub fn register_entity(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.known_entities.insert(name.clone(), name);
    }

    /// Register a source-level type name that resolves to `entity`.
    pub fn register_entity_alias(&mut self, alias: impl Into<String>, entity: impl Into<String>) {
        let entity = entity.into();
        self.known_entities.insert(alias.into(), entity.clone());
        self.known_entities.entry(entity.clone()).or_insert(entity);
    }

    pub fn is_known_entity(&self, name: &str) -> bool {
        self.known_entities.contains_key(name)
    }

    /// Entity name a known type name resolves to.
    pub fn resolve_entity(&self, name: &str) -> Option<&str> {
        self.known_entities.get(name).map(String::as_str)
    }

    pub fn register_enum(&mut self, name: impl Into<String>, values: Vec<String>) {
        self.enums.insert(name.into(), values);
    }

    pub fn enum_values(&self, name: &str) -> Option<&[String]> {
        self.enums.get(name).map(Vec::as_slice)
    }

    /// Gate a candidate on the confidence floor. Returns false and counts an
    /// omission when the candidate falls below it.
    pub fn admit(&mut self, confidence: f64, candidate: &str) -> bool {
        if confidence >= self.confidence_floor {
            return true;
        }
        self.omissions += 1;
        events::low_confidence_omission(&self.path, candidate, confidence, self.confidence_floor);
        false
    }

    /// Record a construct that parsed but has no canonical meaning.
    pub fn skip_construct(&mut self, construct: impl Into<String>, line: u32, reason: impl Into<String>) {
        let construct = construct.into();
        let reason = reason.into();
        events::construct_skipped(&self.path, &construct, line, &reason);
        self.diagnostics.push(ExtractionError::UnsupportedConstruct {
            construct,
            line,
            reason,
        });
    }

    /// Record a non-fatal modelling error such as a duplicate field.
    pub fn record(&mut self, error: ExtractionError) {
        tracing::debug!(path = %self.path.display(), error = %error, "extraction diagnostic");
        self.diagnostics.push(error);
    }

    pub fn diagnostics(&self) -> &[ExtractionError] {
        &self.diagnostics
    }

    pub fn omissions(&self) -> usize {
        self.omissions
    }

    /// Hand diagnostics and the omission count to the caller.
    pub fn finish(self) -> (Vec<ExtractionError>, usize) {
        (self.diagnostics, self.omissions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admit_counts_omissions() {
        let mut ctx = ExtractionContext::new("a.py", SourceLanguage::Python).with_confidence_floor(0.8);
        assert!(ctx.admit(0.95, "get_user"));
        assert!(!ctx.admit(0.70, "helper"));
        assert!(ctx.admit(0.80, "edge"));
        assert_eq!(ctx.omissions(), 1);
        assert!(ctx.diagnostics().is_empty());
    }

    #[test]
    fn test_skip_construct_records_diagnostic() {
        let mut ctx = ExtractionContext::new("a.sql", SourceLanguage::Sql);
        ctx.skip_construct("CREATE TABLE AS", 4, "no column list");
        assert_eq!(
            ctx.diagnostics(),
            &[ExtractionError::UnsupportedConstruct {
                construct: "CREATE TABLE AS".into(),
                line: 4,
                reason: "no column list".into(),
            }]
        );
    }

    #[test]
    fn test_enums_and_entities() {
        let mut ctx = ExtractionContext::new("s.prisma", SourceLanguage::Prisma)
            .with_known_entities(["User"]);
        ctx.register_enum("Role", vec!["USER".into(), "ADMIN".into()]);
        assert_eq!(ctx.enum_values("Role").map(<[String]>::len), Some(2));
        assert!(ctx.is_known_entity("User"));
        assert!(!ctx.is_known_entity("Post"));

        ctx.register_entity_alias("PostEntity", "Post");
        assert_eq!(ctx.resolve_entity("PostEntity"), Some("Post"));
        assert_eq!(ctx.resolve_entity("Post"), Some("Post"));
        assert_eq!(ctx.resolve_entity("User"), Some("User"));
    }
}
