//! Initialization functions for tracing

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentationConfig {
    /// Service name attached to every event
    pub service_name: String,
    /// Log level filter (e.g., "info", "debug", "trace"), overridden by `RUST_LOG`
    pub log_level: String,
    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

impl Default for InstrumentationConfig {
    fn default() -> Self {
        Self {
            service_name: "tokenward".to_string(),
            log_level: "info".to_string(),
            json: false,
        }
    }
}

impl InstrumentationConfig {
    pub fn with_log_level(log_level: impl Into<String>) -> Self {
        Self {
            log_level: log_level.into(),
            ..Self::default()
        }
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.log_level))
            .unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_tracing(config: &InstrumentationConfig) -> CoreResult<()> {
    let env_filter = config.env_filter();
    let registry = tracing_subscriber::registry().with(env_filter);

    let result = if config.json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };

    result.map_err(|e| CoreError::internal_error(format!("failed to install subscriber: {e}")))?;
    tracing::debug!(service = %config.service_name, "tracing initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails_instead_of_panicking() {
        let config = InstrumentationConfig::with_log_level("debug");
        // Another test binary may have installed one already, so only the
        // second call is asserted.
        let _ = init_tracing(&config);
        assert!(matches!(
            init_tracing(&config),
            Err(CoreError::Internal { .. })
        ));
    }
}
