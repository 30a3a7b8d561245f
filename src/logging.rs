//! Subscriber setup for binaries. The library itself only emits events.

use tracing_subscriber::EnvFilter;

/// Install a stderr fmt subscriber.
///
/// `RUST_LOG` wins when set; otherwise the level is `debug` if `debug` is
/// true and `warn` if not. Calling this twice is harmless.
pub fn init(debug: bool) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(debug))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn filter(debug: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(debug))
}

fn default_filter(debug: bool) -> EnvFilter {
    EnvFilter::new(if debug { "debug" } else { "warn" })
}
