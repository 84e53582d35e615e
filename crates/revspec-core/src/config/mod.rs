//! Configuration system for revspec.
//! TOML-based, 4-layer resolution: CLI > env > project > user > defaults.

pub mod extraction_config;
pub mod mapper_config;
pub mod pattern_config;
pub mod revspec_config;

pub use extraction_config::ExtractionConfig;
pub use mapper_config::MapperConfig;
pub use pattern_config::PatternConfig;
pub use revspec_config::{CliOverrides, RevspecConfig};
