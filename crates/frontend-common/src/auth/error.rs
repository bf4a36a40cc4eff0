//! Errors surfaced by the authorized client

use thiserror::Error;
use tokenward_http::ClientError;

#[derive(Debug, Error)]
pub enum AuthError {
    /// The refresh endpoint answered with an error status
    #[error("Token refresh rejected ({status}): {message}")]
    RefreshRejected { status: u16, message: String },

    /// The refresh endpoint could not be reached, or its answer was unusable
    #[error("Token is stale, refresh failed: {reason}")]
    Stale { reason: String },

    #[error(transparent)]
    Client(#[from] ClientError),
}

impl AuthError {
    /// Whether the session is gone and the user must sign in again
    pub fn is_signed_out(&self) -> bool {
        matches!(self, Self::RefreshRejected { .. })
    }
}
