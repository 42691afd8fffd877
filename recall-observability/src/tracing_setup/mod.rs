//! Subscriber installation.

pub mod events;
pub mod spans;

use recall_core::config::{defaults, ObservabilityConfig};
use recall_core::errors::{RecallError, RecallResult};
use tracing_subscriber::EnvFilter;

/// Environment variable holding filter directives, e.g. `recall_indexer=debug,info`.
pub const LOG_ENV: &str = "RECALL_LOG";

/// Install the global JSON subscriber using `RECALL_LOG` (default `info`).
pub fn init_tracing() -> RecallResult<()> {
    let directives =
        std::env::var(LOG_ENV).unwrap_or_else(|_| defaults::DEFAULT_LOG_LEVEL.to_string());
    init_tracing_with_filter(&directives)
}

/// Install the global JSON subscriber using the configured level.
/// `RECALL_LOG`, when set, still wins.
pub fn init_from_config(config: &ObservabilityConfig) -> RecallResult<()> {
    let directives = std::env::var(LOG_ENV).unwrap_or_else(|_| config.log_level.clone());
    init_tracing_with_filter(&directives)
}

/// Install the global JSON subscriber with explicit filter directives.
///
/// Fails if the directives don't parse or a global subscriber is already set.
pub fn init_tracing_with_filter(directives: &str) -> RecallResult<()> {
    let filter = EnvFilter::try_new(directives)
        .map_err(|e| RecallError::ConfigError(format!("{LOG_ENV}: {e}")))?;

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_target(true)
        .with_current_span(true)
        .try_init()
        .map_err(|e| RecallError::ConfigError(format!("tracing init: {e}")))
}
