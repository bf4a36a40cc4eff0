//! Authentication store and the read/dispatch views handed to consumers

use super::refresh::{RefreshGate, RefreshOutcome};
use crate::client::AuthorizedClient;
use std::sync::Arc;
use tokenward_core::{
    AuthConfig, AuthSnapshot, Claims, CoreResult, CredentialStore, SessionStatus, decode_claims,
};
use tokenward_http::{ClientError, PublicClient, TypedClientBuilder};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Holds the current token and its claims
///
/// Construct one per application with [`AuthStore::new`], call
/// [`AuthStore::mount`] once, and hand [`AuthContext`] to code that only reads
/// the session and [`AuthDispatch`] to code that changes it or makes
/// authorized requests.
pub struct AuthStore {
    config: AuthConfig,
    public: PublicClient,
    credentials: Arc<dyn CredentialStore>,
    state: watch::Sender<AuthSnapshot>,
    gate: RefreshGate,
}

impl AuthStore {
    /// Create a store around an existing plain client
    pub fn new(
        config: AuthConfig,
        public: PublicClient,
        credentials: Arc<dyn CredentialStore>,
    ) -> Arc<Self> {
        let (state, _) = watch::channel(AuthSnapshot::default());
        Arc::new(Self {
            config,
            public,
            credentials,
            state,
            gate: RefreshGate::new(),
        })
    }

    /// Create a store and the plain client it refreshes through
    pub fn from_config(
        config: AuthConfig,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Arc<Self>, ClientError> {
        let public = TypedClientBuilder::new()
            .base_url(config.base_url.clone())
            .maybe_timeout(config.timeout())
            .build_public()?;
        Ok(Self::new(config, public, credentials))
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Load the first token
    pub async fn mount(&self) -> RefreshOutcome {
        debug!("mounting auth store");
        self.refresh().await
    }

    /// Exchange the current session for a new token.
    ///
    /// Never fails: the outcome says what happened and the session status is
    /// updated to match. Concurrent calls share a single request.
    pub async fn refresh(&self) -> RefreshOutcome {
        self.gate.run(|| self.refresh_once()).await
    }

    async fn refresh_once(&self) -> RefreshOutcome {
        let pending = PendingRefresh::begin(&self.state);
        let outcome = self.exchange().await;
        pending.settle();
        outcome
    }

    async fn exchange(&self) -> RefreshOutcome {
        let response = match self.public.fetch_token(&self.config.refresh_path).await {
            Ok(response) => response,
            Err(error) if error.is_error_response() => return self.reject(&error),
            Err(error) => return self.mark_stale(error.to_string()),
        };

        match decode_claims(&response.access_token) {
            Ok(claims) => {
                let snapshot = self.replace(response.access_token, claims);
                info!(
                    user_id = snapshot.claims.id,
                    exp = snapshot.claims.exp,
                    generation = snapshot.generation,
                    "access token refreshed"
                );
                RefreshOutcome::Refreshed(snapshot)
            }
            Err(error) => self.mark_stale(error.to_string()),
        }
    }

    fn reject(&self, error: &ClientError) -> RefreshOutcome {
        let status = error.status().unwrap_or_default();
        warn!(status, error = %error, "token refresh rejected, removing stored credential");

        if let Err(e) = self.credentials.remove(&self.config.credential_key) {
            warn!(error = %e, key = %self.config.credential_key, "failed to remove stored credential");
        }
        self.set_status(SessionStatus::SignedOut);

        RefreshOutcome::Rejected {
            status,
            message: error.to_string(),
        }
    }

    fn mark_stale(&self, reason: String) -> RefreshOutcome {
        warn!(reason = %reason, "token refresh failed without a response, keeping stale token");
        self.set_status(SessionStatus::Stale);
        RefreshOutcome::Stale { reason }
    }

    fn set_status(&self, status: SessionStatus) {
        self.state.send_modify(|snapshot| *snapshot = snapshot.with_status(status));
    }

    fn replace(&self, token: String, claims: Claims) -> AuthSnapshot {
        let mut replaced = AuthSnapshot::default();
        self.state.send_modify(|snapshot| {
            *snapshot = snapshot.replace(token, claims);
            replaced = snapshot.clone();
        });
        replaced
    }

    /// Current token, claims and status
    pub fn snapshot(&self) -> AuthSnapshot {
        self.state.borrow().clone()
    }

    /// Watch for session changes
    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.state.subscribe()
    }

    /// Read-only view
    pub fn context(self: &Arc<Self>) -> AuthContext {
        AuthContext {
            store: Arc::clone(self),
        }
    }

    /// Mutating view, with the authorized client
    pub fn dispatch(self: &Arc<Self>) -> AuthDispatch {
        AuthDispatch {
            store: Arc::clone(self),
        }
    }

    pub(crate) fn public_client(&self) -> &PublicClient {
        &self.public
    }
}

/// Publishes `Refreshing` for the duration of one refresh.
///
/// If the refresh future is dropped before it settles, the status it replaced
/// is put back so the session does not stay `Refreshing`.
struct PendingRefresh<'a> {
    state: &'a watch::Sender<AuthSnapshot>,
    previous: SessionStatus,
    settled: bool,
}

impl<'a> PendingRefresh<'a> {
    fn begin(state: &'a watch::Sender<AuthSnapshot>) -> Self {
        let mut previous = SessionStatus::default();
        state.send_modify(|snapshot| {
            previous = snapshot.status;
            *snapshot = snapshot.with_status(SessionStatus::Refreshing);
        });
        Self {
            state,
            previous,
            settled: false,
        }
    }

    fn settle(mut self) {
        self.settled = true;
    }
}

impl Drop for PendingRefresh<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let previous = self.previous;
        let restored = self.state.send_if_modified(|snapshot| {
            if snapshot.status != SessionStatus::Refreshing {
                return false;
            }
            *snapshot = snapshot.with_status(previous);
            true
        });
        if restored {
            debug!(status = %previous, "refresh dropped before completion, status restored");
        }
    }
}

/// Read access to the session
#[derive(Clone)]
pub struct AuthContext {
    store: Arc<AuthStore>,
}

impl AuthContext {
    pub fn snapshot(&self) -> AuthSnapshot {
        self.store.snapshot()
    }

    pub fn token(&self) -> String {
        self.store.state.borrow().token.clone()
    }

    pub fn claims(&self) -> Claims {
        self.store.state.borrow().claims.clone()
    }

    pub fn status(&self) -> SessionStatus {
        self.store.state.borrow().status
    }

    pub fn is_authenticated(&self) -> bool {
        let state = self.store.state.borrow();
        state.has_token() && state.status != SessionStatus::SignedOut
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.store.subscribe()
    }
}

/// Write access to the session
#[derive(Clone)]
pub struct AuthDispatch {
    store: Arc<AuthStore>,
}

impl AuthDispatch {
    /// Replace the token; its claims are decoded from it
    pub fn set_token(&self, token: impl Into<String>) -> CoreResult<AuthSnapshot> {
        let token = token.into();
        let claims = decode_claims(&token)?;
        Ok(self.store.replace(token, claims))
    }

    /// Replace the claims and keep the token
    pub fn set_claims(&self, claims: Claims) -> AuthSnapshot {
        debug!(exp = claims.exp, "claims replaced without a new token");
        let token = self.store.state.borrow().token.clone();
        self.store.replace(token, claims)
    }

    /// Replace token and claims as given, without decoding
    pub fn set_session(&self, token: impl Into<String>, claims: Claims) -> AuthSnapshot {
        self.store.replace(token.into(), claims)
    }

    /// Forget the session and remove the stored credential
    pub fn sign_out(&self) -> CoreResult<()> {
        self.store
            .credentials
            .remove(&self.store.config.credential_key)?;
        self.store.state.send_modify(|snapshot| {
            *snapshot = AuthSnapshot {
                status: SessionStatus::SignedOut,
                generation: snapshot.generation + 1,
                ..AuthSnapshot::default()
            };
        });
        info!("signed out");
        Ok(())
    }

    pub async fn refresh(&self) -> RefreshOutcome {
        self.store.refresh().await
    }

    /// Client that attaches the current token to every request, refreshing it first when expired
    pub fn client(&self) -> AuthorizedClient {
        AuthorizedClient::new(Arc::clone(&self.store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokenward_core::MemoryCredentialStore;

    fn store() -> Arc<AuthStore> {
        AuthStore::from_config(
            AuthConfig::default(),
            Arc::new(MemoryCredentialStore::with_entry("token", "stored")),
        )
        .unwrap()
    }

    #[test]
    fn test_new_store_starts_empty() {
        let store = store();
        let context = store.context();

        assert_eq!(context.token(), "");
        assert_eq!(context.claims(), Claims::default());
        assert_eq!(context.status(), SessionStatus::Uninitialized);
        assert!(!context.is_authenticated());
    }

    #[test]
    fn test_set_session_updates_token_and_claims_together() {
        let store = store();
        let mut rx = store.subscribe();
        let claims = Claims {
            id: 3,
            email: "c@d.e".to_string(),
            iat: 10,
            exp: 20,
        };

        store.dispatch().set_session("tok", claims.clone());

        assert!(rx.has_changed().unwrap());
        let seen = rx.borrow_and_update().clone();
        assert_eq!(seen.token, "tok");
        assert_eq!(seen.claims, claims);
        assert_eq!(seen.status, SessionStatus::Valid);
        assert_eq!(seen.generation, 1);
        assert!(store.context().is_authenticated());
    }

    #[test]
    fn test_set_token_rejects_malformed_token() {
        let store = store();
        assert!(store.dispatch().set_token("garbage").is_err());
        assert_eq!(store.snapshot(), AuthSnapshot::default());
    }

    #[test]
    fn test_set_claims_keeps_token() {
        let store = store();
        let dispatch = store.dispatch();
        dispatch.set_session("tok", Claims::default());

        let claims = Claims {
            exp: 99,
            ..Claims::default()
        };
        let snapshot = dispatch.set_claims(claims);
        assert_eq!(snapshot.token, "tok");
        assert_eq!(snapshot.claims.exp, 99);
    }

    #[test]
    fn test_sign_out_clears_state_and_credential() {
        let credentials = Arc::new(MemoryCredentialStore::with_entry("token", "stored"));
        let store = AuthStore::from_config(AuthConfig::default(), credentials.clone()).unwrap();
        let dispatch = store.dispatch();
        dispatch.set_session("tok", Claims::default());

        dispatch.sign_out().unwrap();

        let snapshot = store.snapshot();
        assert_eq!(snapshot.token, "");
        assert_eq!(snapshot.status, SessionStatus::SignedOut);
        assert_eq!(snapshot.generation, 2);
        assert_eq!(credentials.get("token").unwrap(), None);
        assert!(!store.context().is_authenticated());
    }
}
