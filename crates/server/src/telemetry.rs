//! Tracing initialisation

use anyhow::anyhow;
use bruteguard_config::LogLevel;
use tracing_subscriber::EnvFilter;

/// Install the global JSON subscriber.
///
/// `RUST_LOG` overrides the configured level when set.
pub fn init(level: LogLevel) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_filter_str()));

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|err| anyhow!("failed to initialise tracing: {err}"))
}
