//! Authentication module

pub mod context;
pub mod error;
pub mod refresh;

// Re-export commonly used items
pub use context::{AuthContext, AuthDispatch, AuthStore};
pub use error::AuthError;
pub use refresh::RefreshOutcome;
