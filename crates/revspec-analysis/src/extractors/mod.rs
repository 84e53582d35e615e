//! Per-language extractors: syntax tree in, canonical entities and actions out.

pub mod context;
pub mod java;
pub mod naming;
pub mod prisma;
pub mod python;
pub mod routes;
pub mod rust_lang;
pub mod rust_routes;
pub mod sql;
pub mod type_map;
pub mod typescript;

pub use context::ExtractionContext;
pub use revspec_core::constants::DEFAULT_CONFIDENCE_FLOOR;

use crate::adapters::SyntaxTree;
use crate::language::SourceLanguage;
use crate::model::{CanonicalAction, CanonicalEntity};

/// Trait implemented by every per-language extractor.
pub trait Extractor: Send + Sync {
    /// The language whose trees this extractor understands.
    fn language(&self) -> SourceLanguage;

    /// Every entity defined in the tree, in document order.
    fn extract_entities(&self, tree: &SyntaxTree, ctx: &mut ExtractionContext) -> Vec<CanonicalEntity>;

    /// The first entity, if any.
    fn extract_entity(&self, tree: &SyntaxTree, ctx: &mut ExtractionContext) -> Option<CanonicalEntity> {
        self.extract_entities(tree, ctx).into_iter().next()
    }

    /// Every action at or above the context's confidence floor.
    fn extract_actions(&self, _tree: &SyntaxTree, _ctx: &mut ExtractionContext) -> Vec<CanonicalAction> {
        Vec::new()
    }
}

/// Returns the extractor for a language.
pub fn extractor_for(language: SourceLanguage) -> Box<dyn Extractor> {
    match language {
        SourceLanguage::Sql => Box::new(sql::SqlExtractor),
        SourceLanguage::Prisma => Box::new(prisma::PrismaExtractor),
        SourceLanguage::TypeScript => Box::new(typescript::TypeScriptExtractor),
        SourceLanguage::Rust => Box::new(rust_lang::RustExtractor),
        SourceLanguage::Java => Box::new(java::JavaExtractor),
        SourceLanguage::Python => Box::new(python::PythonExtractor),
    }
}
