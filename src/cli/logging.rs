//! Diagnostic logging setup

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding the log filter directives
pub const LOG_ENV: &str = "EMBULK_PLUGINS_LOG";

/// Installs the stderr subscriber
///
/// `EMBULK_PLUGINS_LOG` wins when set; otherwise `warn`, or `debug` with
/// `--verbose`. Conflict reports are emitted at `warn`, so they show by
/// default.
pub fn init(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .without_time()
        .compact();

    // Already installed (e.g. when called twice in-process) is not an error
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
