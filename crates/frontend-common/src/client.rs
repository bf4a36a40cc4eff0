//! Client that keeps the attached credential fresh

use crate::auth::context::AuthStore;
use crate::auth::error::AuthError;
use crate::auth::refresh::RefreshOutcome;
use chrono::Utc;
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, warn};

/// Pre-configured client for authenticated endpoints
///
/// Every request goes through the interceptor: if the stored token expired,
/// it is refreshed first (sharing any refresh already in flight) and the new
/// token is attached; otherwise the current token is attached unchanged.
#[derive(Clone)]
pub struct AuthorizedClient {
    store: Arc<AuthStore>,
}

impl AuthorizedClient {
    pub(crate) fn new(store: Arc<AuthStore>) -> Self {
        Self { store }
    }

    pub fn base_url(&self) -> &str {
        self.store.public_client().base_url()
    }

    /// Create a request builder. The credential is attached by
    /// [`execute`](Self::execute) / [`send`](Self::send), not here.
    pub fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.store.public_client().request(method, path)
    }

    /// Token to attach to a request issued at `now_ms`
    pub async fn intercept_at(&self, now_ms: i64) -> Result<String, AuthError> {
        let snapshot = self.store.snapshot();
        if !snapshot.is_expired_at(now_ms) {
            return Ok(snapshot.token);
        }

        debug!(exp = snapshot.claims.exp, now_ms, "token expired, refreshing before request");
        match self.store.refresh().await {
            RefreshOutcome::Refreshed(snapshot) => Ok(snapshot.token),
            RefreshOutcome::Rejected { status, message } => {
                Err(AuthError::RefreshRejected { status, message })
            }
            RefreshOutcome::Stale { reason } => Err(AuthError::Stale { reason }),
        }
    }

    /// Token to attach to a request issued now
    pub async fn intercept(&self) -> Result<String, AuthError> {
        self.intercept_at(Utc::now().timestamp_millis()).await
    }

    /// Attach a fresh credential and send, returning the raw response
    pub async fn send(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, AuthError> {
        let token = self.intercept().await?;
        let response = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(tokenward_http::ClientError::from)?;
        Ok(response)
    }

    /// Attach a fresh credential, send and decode the JSON body
    pub async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, AuthError> {
        let token = self.intercept().await?;
        let result = self
            .store
            .public_client()
            .execute(request.bearer_auth(token))
            .await;

        if let Err(error) = &result {
            if error.is_auth_expired() {
                warn!(error = %error, "server rejected the attached token");
            }
        }
        Ok(result?)
    }

    /// GET a JSON resource
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, AuthError> {
        self.execute(self.request(Method::GET, path)).await
    }

    /// POST a JSON body and decode the JSON response
    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, AuthError> {
        self.execute(self.request(Method::POST, path).json(body))
            .await
    }
}
