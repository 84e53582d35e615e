//! Shared constants for the revspec engine.

/// revspec version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Extractors never emit below this confidence unless configured otherwise.
pub const DEFAULT_CONFIDENCE_FLOOR: f64 = 0.50;

/// Wall-clock budget for parsing a single source unit.
pub const DEFAULT_PARSE_BUDGET_MS: u64 = 2_000;

/// Maximum source size in bytes accepted by the batch pipeline (default: 1MB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1_048_576;

/// Entities whose aggregate pattern confidence falls below this are reported.
pub const DEFAULT_MIN_PATTERN_CONFIDENCE: f64 = 0.80;

/// Share of audit synonym groups required for an audit-trail match.
pub const DEFAULT_AUDIT_THRESHOLD: f64 = 0.50;

/// Schema assigned when the source does not name one.
pub const DEFAULT_SCHEMA: &str = "public";

/// Bucket name for actions whose owning entity cannot be inferred.
pub const FALLBACK_ENTITY_NAME: &str = "Entity";

// ---- Confidence bands ----

/// Unambiguous syntactic marker (explicit mapping annotation, column definition).
pub const CONFIDENCE_EXPLICIT: f64 = 0.95;

/// Structural but indirect marker (view-class method, repository base method).
pub const CONFIDENCE_STRUCTURAL: f64 = 0.90;

/// Name-based match backed by a framework signal.
pub const CONFIDENCE_NAMED: f64 = 0.85;

/// Route discovered by regex over flattened source text.
pub const CONFIDENCE_TEXT_PATTERN: f64 = 0.85;

/// Pure name heuristic with no decorator or annotation.
pub const CONFIDENCE_HEURISTIC: f64 = 0.70;
