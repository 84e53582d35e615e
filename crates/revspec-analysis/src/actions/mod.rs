//! CRUD classification and cross-language action grouping.

pub mod crud;
pub mod mapper;

pub use crud::{crud_from_http, crud_from_name};
pub use mapper::{ActionMetadata, EntityActions, UniversalActionMapper};
