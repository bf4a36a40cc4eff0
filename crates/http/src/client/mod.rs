//! Plain HTTP client for the authentication backend

pub mod error;
pub mod token;

use error::ClientError;
use reqwest::{Client, ClientBuilder, header};
use std::time::Duration;

const USER_AGENT: &str = concat!("tokenward-client/", env!("CARGO_PKG_VERSION"));

/// Client without any credential of its own
///
/// Cookies or other ambient browser credentials still travel with its
/// requests, which is what the refresh endpoint relies on.
#[derive(Clone, Debug)]
pub struct PublicClient {
    client: Client,
    base_url: String,
}

impl PublicClient {
    /// Create a new public client
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::new_with_timeout(base_url, None)
    }

    /// Create a new public client with optional timeout
    fn new_with_timeout(
        base_url: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, ClientError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ClientError::Configuration("base_url is empty".into()));
        }

        #[cfg(not(target_arch = "wasm32"))]
        let client = {
            let mut builder = ClientBuilder::new().user_agent(USER_AGENT);
            if let Some(timeout) = timeout {
                builder = builder.timeout(timeout);
            }
            builder.build()?
        };

        #[cfg(target_arch = "wasm32")]
        let client = {
            let _ = timeout; // Timeouts not supported on WASM
            ClientBuilder::new().user_agent(USER_AGENT).build()?
        };

        Ok(Self { client, base_url })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Create a request builder without authentication
    pub fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client.request(method, url)
    }

    /// Create a request builder carrying `Authorization: Bearer <token>`
    pub fn bearer_request(
        &self,
        method: reqwest::Method,
        path: &str,
        token: &str,
    ) -> reqwest::RequestBuilder {
        self.request(method, path)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
    }

    /// Execute a request and handle common errors
    pub async fn execute<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            Ok(response.json().await?)
        } else {
            let message = response.text().await.unwrap_or_else(|_| status.to_string());
            Err(ClientError::from_status(status, message))
        }
    }
}

/// Builder for [`PublicClient`]
#[derive(Debug, Default)]
pub struct TypedClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
}

impl TypedClientBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout (ignored on WASM)
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the request timeout if one is configured
    pub fn maybe_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build a public client
    pub fn build_public(self) -> Result<PublicClient, ClientError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::Configuration("base_url is required".into()))?;

        PublicClient::new_with_timeout(base_url, self.timeout)
    }
}
