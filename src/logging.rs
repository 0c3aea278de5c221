//! Diagnostic tracing, written to stderr.
//!
//! Progress shown to the user during an analysis is separate: it goes through
//! the analyzer's progress sink and is printed (or collected) by the caller.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set. Otherwise the level is `warn`, or
/// `faultline=debug` when `verbose` is on.
pub fn init(verbose: bool) {
    let fallback = if verbose { "faultline=debug,warn" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init();
}
