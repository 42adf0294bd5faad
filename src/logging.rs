//! Tracing subscriber setup for the `funnelx` binary.
//!
//! The library itself only emits `tracing` events; embedding services bring
//! their own subscriber.

use tracing_subscriber::EnvFilter;

/// Environment variable holding an `EnvFilter` directive.
pub const LOG_ENV: &str = "FUNNELX_LOG";

/// Build the filter: `FUNNELX_LOG` if set and valid, else `debug` when
/// verbose, else `warn`.
pub fn env_filter(verbose: bool) -> EnvFilter {
    let fallback = if verbose { "debug" } else { "warn" };
    match dotenvy::var(LOG_ENV) {
        Ok(directive) => EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(fallback)),
        Err(_) => EnvFilter::new(fallback),
    }
}

/// Install a stderr fmt subscriber. Later calls are no-ops.
pub fn init(verbose: bool) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbose))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
