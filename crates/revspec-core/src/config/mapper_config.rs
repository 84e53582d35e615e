//! Action mapper and canonical output configuration.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_SCHEMA;

/// Configuration for the universal action mapper and canonical map output.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MapperConfig {
    /// Schema assigned to entities that do not declare one. Default: "public".
    pub default_schema: Option<String>,
    /// Emit the `_metadata` block in canonical maps. Default: true.
    pub include_metadata: Option<bool>,
}

impl MapperConfig {
    /// Returns the effective default schema.
    pub fn effective_default_schema(&self) -> &str {
        self.default_schema.as_deref().unwrap_or(DEFAULT_SCHEMA)
    }

    /// Returns whether `_metadata` is emitted, defaulting to true.
    pub fn effective_include_metadata(&self) -> bool {
        self.include_metadata.unwrap_or(true)
    }
}
