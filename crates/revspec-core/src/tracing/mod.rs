//! Observability for revspec.
//! `tracing` crate with `EnvFilter`, per-subsystem log levels.

pub mod events;
pub mod setup;

pub use setup::init_tracing;
