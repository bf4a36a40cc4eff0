//! tokenward core types and utilities
//!
//! Claims decoding, the session snapshot shared with consumers, the
//! credential storage seam and client configuration.

pub mod claims;
pub mod config;
pub mod error;
#[cfg(feature = "tracing")]
pub mod logging;
pub mod session;
pub mod storage;

pub use claims::{Claims, decode_claims};
pub use config::AuthConfig;
pub use error::{CoreError, CoreResult};
pub use session::{AuthSnapshot, SessionStatus};
#[cfg(not(target_arch = "wasm32"))]
pub use storage::FileCredentialStore;
#[cfg(target_arch = "wasm32")]
pub use storage::LocalStorageCredentialStore;
pub use storage::{CredentialStore, MemoryCredentialStore};
