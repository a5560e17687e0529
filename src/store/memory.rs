//! Thread-safe in-memory [`TokenStore`] for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::AccessToken,
	store::{StoreError, TokenStore},
};

/// Keeps the current token in-process; clones share the same slot.
#[derive(Clone, Debug, Default)]
pub struct MemoryTokenStore(Arc<RwLock<Option<AccessToken>>>);
impl MemoryTokenStore {
	/// Creates a store seeded with `token`.
	pub fn with_token(token: AccessToken) -> Self {
		Self(Arc::new(RwLock::new(Some(token))))
	}
}
impl TokenStore for MemoryTokenStore {
	fn access_token(&self) -> Option<AccessToken> {
		self.0.read().clone()
	}

	fn save_access_token(&self, token: AccessToken) -> Result<(), StoreError> {
		token.validate()?;

		*self.0.write() = Some(token);

		Ok(())
	}

	fn reset_access_token(&self) {
		self.0.write().take();
	}
}
