//! Tracing initialization for binaries and tests that embed pagoda.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::constants::LOG_ENV_VAR;

static INIT: Once = Once::new();

/// Initialize the tracing/logging system.
///
/// Reads the `PAGODA_LOG` environment variable for per-module log levels.
/// Format: `PAGODA_LOG=pagoda_search::skeleton=debug,pagoda_search=info`
///
/// Falls back to `pagoda=info` if `PAGODA_LOG` is not set or is invalid.
///
/// Idempotent. The engine itself never calls this.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
            .unwrap_or_else(|_| EnvFilter::new("pagoda=info"));
        install(filter, false);
    });
}

/// Initialize with an explicit filter directive, optionally as JSON lines.
/// Later calls are no-ops.
pub fn init_tracing_with_filter(directives: &str, json: bool) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new("info"));
        install(filter, json);
    });
}

fn install(filter: EnvFilter, json: bool) {
    let registry = tracing_subscriber::registry().with(filter);
    // try_init: another subscriber may already be installed by the host.
    let result = if json {
        registry.with(fmt::layer().json().with_target(true)).try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init()
    };
    if result.is_err() {
        tracing::debug!("global tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialization_is_idempotent() {
        init_tracing_with_filter("pagoda=debug", true);
        assert!(INIT.is_completed());
        // Both entry points share the guard; neither installs twice.
        init_tracing();
        init_tracing_with_filter("not a [valid filter", false);
        tracing::debug!(target: "pagoda", "subscriber installed");
        assert!(INIT.is_completed());
    }
}
