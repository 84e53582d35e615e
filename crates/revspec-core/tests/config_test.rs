//! Tests for the revspec configuration system.

use std::sync::Mutex;

use revspec_core::config::{CliOverrides, RevspecConfig};
use revspec_core::errors::ConfigError;

/// Global mutex to serialize tests that modify environment variables.
static ENV_MUTEX: Mutex<()> = Mutex::new(());

const ENV_KEYS: [&str; 4] = [
    "REVSPEC_EXTRACTION_CONFIDENCE_FLOOR",
    "REVSPEC_EXTRACTION_PARSE_BUDGET_MS",
    "REVSPEC_PATTERNS_MIN_CONFIDENCE",
    "REVSPEC_MAPPER_DEFAULT_SCHEMA",
];

/// Clear all REVSPEC_ env vars and point HOME at an empty directory so a
/// developer's own user config cannot leak into the assertions.
fn isolate_env(home: &std::path::Path) {
    for key in ENV_KEYS {
        std::env::remove_var(key);
    }
    std::env::set_var("HOME", home);
}

#[test]
fn test_four_layer_resolution() {
    let _lock = ENV_MUTEX.lock().unwrap();
    let home = tempfile::TempDir::new().unwrap();
    isolate_env(home.path());

    std::fs::create_dir_all(home.path().join(".revspec")).unwrap();
    std::fs::write(
        home.path().join(".revspec").join("config.toml"),
        "[mapper]\ndefault_schema = \"from_user\"\ninclude_metadata = false\n",
    )
    .unwrap();

    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("revspec.toml"),
        r#"
[extraction]
confidence_floor = 0.6
parse_budget_ms = 500

[patterns]
min_confidence = 0.7

[mapper]
default_schema = "from_project"
"#,
    )
    .unwrap();

    std::env::set_var("REVSPEC_EXTRACTION_PARSE_BUDGET_MS", "750");
    std::env::set_var("REVSPEC_PATTERNS_MIN_CONFIDENCE", "0.75");

    let cli = CliOverrides {
        min_confidence: Some(0.9),
        ..Default::default()
    };
    let config = RevspecConfig::load(dir.path(), Some(&cli)).unwrap();

    // CLI beats env
    assert_eq!(config.patterns.min_confidence, Some(0.9));
    // env beats project
    assert_eq!(config.extraction.parse_budget_ms, Some(750));
    // project beats user
    assert_eq!(config.mapper.effective_default_schema(), "from_project");
    assert_eq!(config.extraction.confidence_floor, Some(0.6));
    // user beats defaults
    assert!(!config.mapper.effective_include_metadata());

    isolate_env(home.path());
}

#[test]
fn test_load_missing_files_fallback() {
    let _lock = ENV_MUTEX.lock().unwrap();
    let home = tempfile::TempDir::new().unwrap();
    isolate_env(home.path());

    let dir = tempfile::TempDir::new().unwrap();
    let config = RevspecConfig::load(dir.path(), None).unwrap();

    assert_eq!(config.extraction.effective_confidence_floor(), 0.50);
    assert_eq!(config.extraction.effective_parse_budget_ms(), 2_000);
    assert_eq!(config.extraction.effective_max_file_size(), 1_048_576);
    assert_eq!(config.patterns.effective_min_confidence(), 0.80);
    assert_eq!(config.patterns.effective_audit_threshold(), 0.50);
    assert_eq!(config.mapper.effective_default_schema(), "public");
    assert!(config.mapper.effective_include_metadata());
}

#[test]
fn test_invalid_toml_syntax() {
    let _lock = ENV_MUTEX.lock().unwrap();
    let home = tempfile::TempDir::new().unwrap();
    isolate_env(home.path());

    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(dir.path().join("revspec.toml"), "this is not valid toml {{{{").unwrap();

    match RevspecConfig::load(dir.path(), None) {
        Err(ConfigError::ParseError { .. }) => {}
        other => panic!("Expected ParseError, got: {:?}", other),
    }
}

#[test]
fn test_out_of_range_floor_rejected() {
    let result = RevspecConfig::from_toml("[extraction]\nconfidence_floor = 1.5\n");
    match result {
        Err(ConfigError::ValidationFailed { field, .. }) => {
            assert_eq!(field, "extraction.confidence_floor");
        }
        other => panic!("Expected ValidationFailed, got: {:?}", other),
    }
}

#[test]
fn test_zero_parse_budget_rejected() {
    let result = RevspecConfig::from_toml("[extraction]\nparse_budget_ms = 0\n");
    assert!(matches!(result, Err(ConfigError::ValidationFailed { .. })));
}

#[test]
fn test_language_floor_override() {
    let config = RevspecConfig::from_toml(
        r#"
[extraction]
confidence_floor = 0.55

[extraction.language_floors]
rust = 0.8
"#,
    )
    .unwrap();

    assert_eq!(config.extraction.floor_for("Rust"), 0.8);
    assert_eq!(config.extraction.floor_for("python"), 0.55);
}

#[test]
fn test_enabled_patterns() {
    let config = RevspecConfig::from_toml("[patterns]\nenabled = [\"trinity\"]\n").unwrap();
    assert!(config.patterns.is_enabled("trinity"));
    assert!(!config.patterns.is_enabled("soft_delete"));

    let all = RevspecConfig::default();
    assert!(all.patterns.is_enabled("soft_delete"));
}

#[test]
fn test_toml_round_trip() {
    let config = RevspecConfig::from_toml(
        "[extraction]\nconfidence_floor = 0.65\n\n[mapper]\ndefault_schema = \"catalog\"\n",
    )
    .unwrap();
    let rendered = config.to_toml().unwrap();
    let reparsed = RevspecConfig::from_toml(&rendered).unwrap();
    assert_eq!(reparsed.extraction.confidence_floor, Some(0.65));
    assert_eq!(reparsed.mapper.effective_default_schema(), "catalog");
}

#[test]
fn test_unknown_keys_ignored() {
    let config = RevspecConfig::from_toml("[future]\nknob = 3\n").unwrap();
    assert_eq!(config.extraction.effective_confidence_floor(), 0.50);
}
