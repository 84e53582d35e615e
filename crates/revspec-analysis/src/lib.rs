//! # revspec-analysis
//!
//! Reverse-engineering engine: source adapters, per-language extractors,
//! the canonical entity/action model, pattern detection, translation merging,
//! foreign-key resolution, and universal action mapping.

pub mod actions;
pub mod adapters;
pub mod canonical;
pub mod extractors;
pub mod language;
pub mod model;
pub mod patterns;
pub mod pipeline;
pub mod relationships;
pub mod translation;

pub use actions::{EntityActions, UniversalActionMapper};
pub use adapters::{adapter_for, Node, SourceAdapter, SyntaxTree};
pub use canonical::{output_path, parse_type_expression};
pub use extractors::{extractor_for, ExtractionContext, Extractor};
pub use language::SourceLanguage;
pub use model::{CanonicalAction, CanonicalEntity, CanonicalField, TypeTier};
pub use patterns::{DetectionResult, PatternKind, PatternOrchestrator, PatternVerdict};
pub use pipeline::{process_batch, BatchOutput, EntityRecord, SourceUnit};
pub use translation::{merge, MergedFieldMap};
