// Logging setup for the binary

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install a stderr subscriber filtered by `RUST_LOG` (default `info`)
///
/// Logs go to stderr so they do not interleave with the host's stdout output.
/// Calling it twice is harmless.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    if tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .try_init()
        .is_err()
    {
        tracing::debug!("logging already initialised");
    }
}
