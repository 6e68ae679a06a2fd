//! Log subscriber setup.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Initialize the global subscriber.
///
/// `REVEIL_LOG` selects the filter (default `info`). When running
/// under systemd, logs additionally go to the journal; the journald
/// layer is skipped silently if the socket is unavailable.
pub fn init() {
    let filter = EnvFilter::try_from_env("REVEIL_LOG")
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let journald = tracing_journald::layer().ok();

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(journald)
        .init();
}
