//! tokenward HTTP module
//!
//! The plain client used to reach the token refresh endpoint, plus the wire
//! types it exchanges.

pub mod client;
pub mod types;

pub use client::error::ClientError;
pub use client::{PublicClient, TypedClientBuilder};
pub use types::TokenResponse;
