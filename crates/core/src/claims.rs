//! Decoded JWT claims
//!
//! Tokens are decoded on the client without signature validation: the server
//! that issued the token is the only party that verifies it. The client only
//! needs the payload to know who is signed in and when the token expires.

use crate::error::{CoreError, CoreResult};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Claims carried by an access token
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    #[serde(default)]
    pub id: i64,
    /// Email of the signed-in user
    #[serde(default)]
    pub email: String,
    /// Issued at (seconds since epoch)
    #[serde(default)]
    pub iat: i64,
    /// Expiration time (seconds since epoch)
    pub exp: i64,
}

impl Claims {
    /// Whether the token expired before `now_ms` (milliseconds since epoch).
    ///
    /// `exp` is in seconds, so it is scaled before comparing. A token whose
    /// expiry equals the current instant is still valid.
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        self.exp.saturating_mul(1000) < now_ms
    }

    /// Whether the token has expired according to the system clock
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp_millis())
    }
}

/// Decode the claims from a compact JWT (`header.payload.signature`).
pub fn decode_claims(token: &str) -> CoreResult<Claims> {
    let mut segments = token.split('.');
    let payload = match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => {
            return Err(CoreError::malformed_token(
                "expected three dot-separated segments",
            ));
        }
    };

    // Some issuers keep the padding even though JWTs use unpadded base64url
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| CoreError::malformed_token(format!("invalid payload encoding: {e}")))?;

    serde_json::from_slice(&bytes)
        .map_err(|e| CoreError::malformed_token(format!("invalid payload: {e}")))
}
