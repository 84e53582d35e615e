//! Top-level revspec configuration with 4-layer resolution.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{ExtractionConfig, MapperConfig, PatternConfig};
use crate::errors::ConfigError;

/// Project config file name, looked up in the project root.
pub const PROJECT_CONFIG_FILE: &str = "revspec.toml";

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. CLI flags (applied via `apply_cli_overrides`)
/// 2. Environment variables (`REVSPEC_*`)
/// 3. Project config (`revspec.toml` in project root)
/// 4. User config (`~/.revspec/config.toml`)
/// 5. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RevspecConfig {
    pub extraction: ExtractionConfig,
    pub patterns: PatternConfig,
    pub mapper: MapperConfig,
}

/// CLI override arguments that can be applied to a config.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub confidence_floor: Option<f64>,
    pub min_confidence: Option<f64>,
    pub parse_budget_ms: Option<u64>,
    pub default_schema: Option<String>,
}

impl RevspecConfig {
    /// Load configuration with 4-layer resolution rooted at `root`.
    pub fn load(root: &Path, cli_overrides: Option<&CliOverrides>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Layer 4 (lowest priority): user config
        if let Some(user_config_path) = Self::user_config_path() {
            if user_config_path.exists() {
                match Self::merge_toml_file(&mut config, &user_config_path) {
                    Ok(()) => {}
                    Err(e @ ConfigError::ParseError { .. }) => return Err(e),
                    Err(e) => {
                        tracing::warn!(error = %e, "ignoring unreadable user config");
                    }
                }
            }
        }

        // Layer 3: project config
        let project_config_path = root.join(PROJECT_CONFIG_FILE);
        if project_config_path.exists() {
            Self::merge_toml_file(&mut config, &project_config_path)?;
        }

        // Layer 2: environment variables
        Self::apply_env_overrides(&mut config);

        // Layer 1 (highest priority): CLI flags
        if let Some(cli) = cli_overrides {
            Self::apply_cli_overrides(&mut config, cli);
        }

        Self::validate(&config)?;

        Ok(config)
    }

    /// Load configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate the configuration values.
    pub fn validate(config: &RevspecConfig) -> Result<(), ConfigError> {
        check_unit_interval(
            "extraction.confidence_floor",
            config.extraction.confidence_floor,
        )?;
        for (language, floor) in &config.extraction.language_floors {
            check_unit_interval(&format!("extraction.language_floors.{language}"), Some(*floor))?;
        }
        check_unit_interval("patterns.min_confidence", config.patterns.min_confidence)?;
        check_unit_interval("patterns.audit_threshold", config.patterns.audit_threshold)?;

        if config.extraction.parse_budget_ms == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "extraction.parse_budget_ms".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if config.extraction.max_file_size == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "extraction.max_file_size".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if let Some(schema) = &config.mapper.default_schema {
            if schema.trim().is_empty() {
                return Err(ConfigError::ValidationFailed {
                    field: "mapper.default_schema".to_string(),
                    message: "must not be empty".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Returns the user config path: `~/.revspec/config.toml`.
    fn user_config_path() -> Option<PathBuf> {
        home_dir().map(|h| h.join(".revspec").join("config.toml"))
    }

    /// Merge a TOML file into the existing config.
    /// Unknown keys are silently ignored.
    fn merge_toml_file(config: &mut RevspecConfig, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let file_config: RevspecConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Self::merge(config, &file_config);
        Ok(())
    }

    /// Merge `other` into `base`, where `other` values override `base` values
    /// only when `other` has a value.
    fn merge(base: &mut RevspecConfig, other: &RevspecConfig) {
        // Extraction
        if other.extraction.confidence_floor.is_some() {
            base.extraction.confidence_floor = other.extraction.confidence_floor;
        }
        for (language, floor) in &other.extraction.language_floors {
            base.extraction
                .language_floors
                .insert(language.to_ascii_lowercase(), *floor);
        }
        if other.extraction.parse_budget_ms.is_some() {
            base.extraction.parse_budget_ms = other.extraction.parse_budget_ms;
        }
        if other.extraction.max_file_size.is_some() {
            base.extraction.max_file_size = other.extraction.max_file_size;
        }

        // Patterns
        if other.patterns.min_confidence.is_some() {
            base.patterns.min_confidence = other.patterns.min_confidence;
        }
        if other.patterns.audit_threshold.is_some() {
            base.patterns.audit_threshold = other.patterns.audit_threshold;
        }
        if !other.patterns.enabled.is_empty() {
            base.patterns.enabled = other.patterns.enabled.clone();
        }

        // Mapper
        if other.mapper.default_schema.is_some() {
            base.mapper.default_schema = other.mapper.default_schema.clone();
        }
        if other.mapper.include_metadata.is_some() {
            base.mapper.include_metadata = other.mapper.include_metadata;
        }
    }

    /// Apply environment variable overrides.
    /// Pattern: `REVSPEC_EXTRACTION_CONFIDENCE_FLOOR`, `REVSPEC_PATTERNS_MIN_CONFIDENCE`, etc.
    fn apply_env_overrides(config: &mut RevspecConfig) {
        if let Ok(val) = std::env::var("REVSPEC_EXTRACTION_CONFIDENCE_FLOOR") {
            if let Ok(v) = val.parse::<f64>() {
                config.extraction.confidence_floor = Some(v);
            }
        }
        if let Ok(val) = std::env::var("REVSPEC_EXTRACTION_PARSE_BUDGET_MS") {
            if let Ok(v) = val.parse::<u64>() {
                config.extraction.parse_budget_ms = Some(v);
            }
        }
        if let Ok(val) = std::env::var("REVSPEC_PATTERNS_MIN_CONFIDENCE") {
            if let Ok(v) = val.parse::<f64>() {
                config.patterns.min_confidence = Some(v);
            }
        }
        if let Ok(val) = std::env::var("REVSPEC_MAPPER_DEFAULT_SCHEMA") {
            config.mapper.default_schema = Some(val);
        }
    }

    /// Apply CLI overrides (highest priority).
    fn apply_cli_overrides(config: &mut RevspecConfig, cli: &CliOverrides) {
        if let Some(v) = cli.confidence_floor {
            config.extraction.confidence_floor = Some(v);
        }
        if let Some(v) = cli.min_confidence {
            config.patterns.min_confidence = Some(v);
        }
        if let Some(v) = cli.parse_budget_ms {
            config.extraction.parse_budget_ms = Some(v);
        }
        if let Some(ref v) = cli.default_schema {
            config.mapper.default_schema = Some(v.clone());
        }
    }

    /// Serialize the config back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: "<serialization>".to_string(),
            message: e.to_string(),
        })
    }
}

fn check_unit_interval(field: &str, value: Option<f64>) -> Result<(), ConfigError> {
    match value {
        Some(v) if !(0.0..=1.0).contains(&v) => Err(ConfigError::ValidationFailed {
            field: field.to_string(),
            message: "must be between 0.0 and 1.0".to_string(),
        }),
        _ => Ok(()),
    }
}

/// Cross-platform home directory resolution.
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
