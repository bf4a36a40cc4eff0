//! Session state shared between the auth store and its consumers

use crate::claims::Claims;
use serde::{Deserialize, Serialize};

/// Where the session stands in its refresh lifecycle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// No refresh has completed yet
    #[default]
    Uninitialized,
    /// A refresh call is in flight
    Refreshing,
    /// The token was issued by the last successful refresh
    Valid,
    /// The last refresh got no response; the previous token is kept
    Stale,
    /// The server rejected the last refresh and the stored credential was removed
    SignedOut,
}

impl SessionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Refreshing => "refreshing",
            Self::Valid => "valid",
            Self::Stale => "stale",
            Self::SignedOut => "signed_out",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token and claims, always replaced together
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSnapshot {
    pub token: String,
    pub claims: Claims,
    pub status: SessionStatus,
    /// Number of token replacements since the store was created
    pub generation: u64,
}

impl AuthSnapshot {
    /// Replace token and claims verbatim
    pub fn replace(&self, token: String, claims: Claims) -> Self {
        Self {
            token,
            claims,
            status: SessionStatus::Valid,
            generation: self.generation + 1,
        }
    }

    /// Same token and claims with a new status
    pub fn with_status(&self, status: SessionStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }

    /// Whether the token needs refreshing before `now_ms`
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        self.claims.is_expired_at(now_ms)
    }

    pub fn has_token(&self) -> bool {
        !self.token.is_empty()
    }
}
