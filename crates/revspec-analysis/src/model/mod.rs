//! Canonical entity / field / action model shared by every extractor.

pub mod action;
pub mod entity;
pub mod field;
pub mod foreign_key;

pub use action::{ActionParameter, ActionStep, CanonicalAction, CrudKind, ExtractionMethod, ParamLocation};
pub use entity::{CanonicalEntity, SourceRef};
pub use field::{CanonicalField, TypeTier};
pub use foreign_key::ForeignKey;
