//! Logging configuration using tracing
//!
//! Logs go to stderr, which is what the workflow runner captures.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber
///
/// Filtering follows `RUST_LOG` and defaults to `info` so that every queued and
/// applied mutation shows up in the workflow log.
///
/// # Example RUST_LOG values
/// - `RUST_LOG=debug` - include rule gating decisions and search queries
/// - `RUST_LOG=ghtriage=trace,reqwest=info` - per-crate levels
///
/// # Errors
/// Returns an error if the subscriber has already been initialized
pub fn init() -> crate::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_ansi(false)
                .compact(),
        )
        .try_init()
        .map_err(|e| crate::TriageError::Other(format!("Failed to initialize tracing: {}", e)))?;

    Ok(())
}

/// Initialize logging for tests (no-op if already initialized)
pub fn init_test() {
    let _ = init();
}
