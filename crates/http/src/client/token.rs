//! Token endpoint client methods

use super::{ClientError, PublicClient};
use crate::types::TokenResponse;
use reqwest::Method;

impl PublicClient {
    /// Ask the backend for a fresh access token
    pub async fn fetch_token(&self, path: &str) -> Result<TokenResponse, ClientError> {
        let request = self.request(Method::GET, path);
        let response: TokenResponse = self.execute(request).await?;
        tracing::trace!(path, "received access token");
        Ok(response)
    }
}
