use tracing_subscriber::EnvFilter;

/// Install the stderr log subscriber. Verbosity follows `RUST_LOG`
/// and defaults to `info`.
///
/// Calling it again is a no-op.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
