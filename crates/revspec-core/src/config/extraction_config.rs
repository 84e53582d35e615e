//! Extraction configuration.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_CONFIDENCE_FLOOR, DEFAULT_MAX_FILE_SIZE, DEFAULT_PARSE_BUDGET_MS};
use crate::FxHashMap;

/// Configuration for adapters and per-language extractors.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Candidates below this confidence are omitted. Default: 0.50.
    pub confidence_floor: Option<f64>,
    /// Per-language floor overrides, keyed by lowercase language name.
    #[serde(default)]
    pub language_floors: FxHashMap<String, f64>,
    /// Per-file parse budget in milliseconds. Default: 2000.
    pub parse_budget_ms: Option<u64>,
    /// Largest accepted source in bytes. Default: 1MB.
    pub max_file_size: Option<u64>,
}

impl ExtractionConfig {
    /// Returns the effective global confidence floor, defaulting to 0.50.
    pub fn effective_confidence_floor(&self) -> f64 {
        self.confidence_floor.unwrap_or(DEFAULT_CONFIDENCE_FLOOR)
    }

    /// Returns the floor for one language, falling back to the global floor.
    pub fn floor_for(&self, language: &str) -> f64 {
        self.language_floors
            .get(&language.to_ascii_lowercase())
            .copied()
            .unwrap_or_else(|| self.effective_confidence_floor())
    }

    /// Returns the effective parse budget, defaulting to 2000ms.
    pub fn effective_parse_budget_ms(&self) -> u64 {
        self.parse_budget_ms.unwrap_or(DEFAULT_PARSE_BUDGET_MS)
    }

    /// Returns the effective max file size, defaulting to 1MB.
    pub fn effective_max_file_size(&self) -> u64 {
        self.max_file_size.unwrap_or(DEFAULT_MAX_FILE_SIZE)
    }
}
