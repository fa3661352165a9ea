use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize tracing with a compact stderr layer.
///
/// Logs go to stderr so the results table on stdout stays clean.
/// Default level: INFO (crate at DEBUG), override via RUST_LOG.
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,benchwatch=debug"));

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .init();

    tracing::debug!("Tracing initialized");
}
