//! Tracing initialisation.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global `fmt` subscriber.
///
/// `RUST_LOG` wins when set; otherwise `fallback` (for example `"info"` or
/// `"seatmap_runtime=debug"`) is used. Calling this twice leaves the first
/// subscriber in place.
pub fn init_tracing(fallback: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_err()
    {
        tracing::debug!("Tracing subscriber already installed");
    }
}
