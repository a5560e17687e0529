//! Token store contract and the built-in stores.
//!
//! The coordinator treats the store as the single source of truth for "do we currently hold
//! credentials". Calls are synchronous because the engine consults the store from transport
//! completion callbacks, outside of any async context.

pub mod file;
pub mod memory;

pub use file::FileTokenStore;
pub use memory::MemoryTokenStore;

// self
use crate::{_prelude::*, auth::AccessToken};

/// Storage backend contract holding the current access token.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Returns the current token, if any.
	fn access_token(&self) -> Option<AccessToken>;

	/// Replaces the current token; rejects tokens that fail [`AccessToken::validate`].
	fn save_access_token(&self, token: AccessToken) -> Result<(), StoreError>;

	/// Clears the current token. Idempotent and infallible.
	fn reset_access_token(&self);
}

/// Error type produced by [`TokenStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// The token violates a storage invariant (e.g., an empty access token).
	#[error("Token is invalid: {reason}.")]
	InvalidToken {
		/// Human-readable reason.
		reason: String,
	},
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
