//! Client configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Authentication client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Base URL every request path is appended to
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Path of the endpoint that issues a fresh access token
    #[serde(default = "default_refresh_path")]
    pub refresh_path: String,
    /// Key of the persisted credential removed when a refresh is rejected
    #[serde(default = "default_credential_key")]
    pub credential_key: String,
    /// Request timeout in seconds (native only, ignored in the browser)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// Log level filter (e.g., "info", "debug", "trace")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl AuthConfig {
    /// Default API base URL
    pub const DEFAULT_BASE_URL: &'static str = "http://localhost:8000/api";

    /// Endpoint returning `{ "accessToken": ... }`
    pub const DEFAULT_REFRESH_PATH: &'static str = "/users/token";

    /// Storage key of the persisted credential
    pub const DEFAULT_CREDENTIAL_KEY: &'static str = "token";

    /// Environment variable prefix for overrides (`TOKENWARD_BASE_URL`, ...)
    pub const ENV_PREFIX: &'static str = "TOKENWARD";

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Start from defaults with a different base URL
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

fn default_base_url() -> String {
    AuthConfig::DEFAULT_BASE_URL.to_string()
}

fn default_refresh_path() -> String {
    AuthConfig::DEFAULT_REFRESH_PATH.to_string()
}

fn default_credential_key() -> String {
    AuthConfig::DEFAULT_CREDENTIAL_KEY.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            refresh_path: default_refresh_path(),
            credential_key: default_credential_key(),
            timeout_secs: None,
            log_level: default_log_level(),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod load {
    use super::AuthConfig;
    use crate::error::{CoreError, CoreResult};
    use config::{Config, Environment, File};
    use std::path::Path;

    impl AuthConfig {
        /// Load configuration from the usual file locations and the environment
        pub fn load() -> CoreResult<Self> {
            Self::load_with(None)
        }

        /// Load configuration from a specific config file
        pub fn load_from_file(path: impl AsRef<Path>) -> CoreResult<Self> {
            Self::load_with(Some(path.as_ref()))
        }

        fn load_with(path: Option<&Path>) -> CoreResult<Self> {
            let mut builder = Config::builder();

            // Start with defaults
            builder = builder.add_source(Config::try_from(&Self::default())?);

            let config_paths = ["tokenward.toml", "config/tokenward.toml"];
            for candidate in &config_paths {
                if Path::new(candidate).exists() {
                    builder = builder.add_source(File::with_name(candidate).required(false));
                }
            }

            if let Some(path) = path {
                builder = builder.add_source(File::from(path));
            }

            // Environment variables override file settings
            builder = builder.add_source(
                Environment::with_prefix(Self::ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

            let config: Self = builder.build()?.try_deserialize()?;
            config.validate()?;
            Ok(config)
        }

        /// Reject configurations the client cannot work with
        pub fn validate(&self) -> CoreResult<()> {
            if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
                return Err(CoreError::invalid_config(format!(
                    "base_url must be an http(s) URL, got {:?}",
                    self.base_url
                )));
            }
            if !self.refresh_path.starts_with('/') {
                return Err(CoreError::invalid_config(format!(
                    "refresh_path must start with '/', got {:?}",
                    self.refresh_path
                )));
            }
            if self.credential_key.is_empty() {
                return Err(CoreError::invalid_config("credential_key must not be empty"));
            }
            Ok(())
        }
    }
}
