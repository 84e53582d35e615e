//! Tests for the revspec tracing setup.

use std::sync::Mutex;

use revspec_core::tracing::setup::{init_tracing, LOG_ENV_VAR};

/// Global mutex to serialize tracing tests (env var manipulation).
static TRACING_MUTEX: Mutex<()> = Mutex::new(());

#[test]
fn test_revspec_log_debug() {
    let _lock = TRACING_MUTEX.lock().unwrap();
    std::env::set_var(LOG_ENV_VAR, "debug");
    init_tracing();
    tracing::debug!(subsystem = "tests", "debug event after init");
    std::env::remove_var(LOG_ENV_VAR);
}

#[test]
fn test_init_tracing_idempotent() {
    let _lock = TRACING_MUTEX.lock().unwrap();
    init_tracing();
    init_tracing();
    init_tracing();
}

#[test]
fn test_invalid_filter_falls_back() {
    let _lock = TRACING_MUTEX.lock().unwrap();
    std::env::set_var(LOG_ENV_VAR, "this is = not [a filter");
    init_tracing();
    std::env::remove_var(LOG_ENV_VAR);
}

#[test]
fn test_structured_events_emit() {
    let _lock = TRACING_MUTEX.lock().unwrap();
    init_tracing();
    let path = std::path::Path::new("schema.sql");
    revspec_core::tracing::events::construct_skipped(path, "CREATE TABLE AS", 3, "no column list");
    revspec_core::tracing::events::low_confidence_omission(path, "handler", 0.4, 0.5);
    revspec_core::tracing::events::file_failed(path, "PARSE_ERROR", &"bad input");
    revspec_core::tracing::events::batch_completed(1, 2, 3, 0, 1, 12);
}
