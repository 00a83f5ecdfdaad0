//! Diagnostic logging via `tracing`.
//!
//! Logs go to stderr so stdout stays clean for command output.  Keys and
//! plaintext payloads must never be passed to a log macro.

use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Install the global subscriber.
///
/// Filter precedence: `RUST_LOG`, then `--verbose` (debug), then the
/// configured default.  A second call is a no-op.
pub fn init(verbose: bool, configured_filter: &str) {
    let filter = match std::env::var("RUST_LOG") {
        Ok(directive) if !directive.is_empty() => EnvFilter::new(directive),
        _ if verbose => EnvFilter::new("debug"),
        _ => EnvFilter::try_new(configured_filter).unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        // Already installed (integration tests); keep the first one.
    }
}
