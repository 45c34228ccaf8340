//! Logging setup for the boundary.
//!
//! The host process may already own a global subscriber, so initialisation
//! never replaces one and never fails the call that requested it.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable consulted before the configured filter
pub const LOG_ENV: &str = "RXCV_LOG";

/// Initialize tracing with `default_filter` unless `RXCV_LOG` is set.
///
/// Returns false if a global subscriber was already installed.
pub fn init_with_filter(default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .try_init()
        .is_ok()
}
