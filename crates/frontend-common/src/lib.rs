//! Client-side session handling for tokenward
//!
//! [`AuthStore`] holds the access token and its decoded claims, refreshes
//! them on mount and whenever a request is about to go out with an expired
//! token, and hands out read ([`AuthContext`]) and write ([`AuthDispatch`])
//! views.

pub mod auth;
pub mod client;

pub use auth::{AuthContext, AuthDispatch, AuthError, AuthStore, RefreshOutcome};
pub use client::AuthorizedClient;
pub use tokenward_core::{AuthConfig, AuthSnapshot, Claims, SessionStatus};
