//! Log subscriber installation for embedding hosts and tests.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Filter directive variable, e.g.
/// `REVSPEC_LOG=revspec_analysis::extractors=debug,revspec_analysis::pipeline=info`.
pub const LOG_ENV_VAR: &str = "REVSPEC_LOG";

const DEFAULT_DIRECTIVE: &str = "revspec=info";

/// Install a formatted subscriber filtered by `REVSPEC_LOG`.
///
/// An unset or unparsable `REVSPEC_LOG` yields `revspec=info`. Skipped
/// constructs log at debug from the extractors, per-unit failures at warn
/// from the pipeline. Only the first call has any effect, and a subscriber
/// already installed by the host is left in place.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .with(filter)
            .try_init();
    });
}
