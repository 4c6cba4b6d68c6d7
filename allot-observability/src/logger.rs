use allot_core::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` wins when set; otherwise `level` is used as the filter.
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Install the global tracing subscriber.
///
/// `level_override` (the CLI flag) takes precedence over the configured level.
pub fn init_tracing(config: &LoggingConfig, level_override: Option<&str>) -> anyhow::Result<()> {
    let filter = env_filter(level_override.unwrap_or(&config.level));

    let result = if config.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init()
    };

    result.map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}
