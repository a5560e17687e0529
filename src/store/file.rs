//! Simple file-backed [`TokenStore`] for CLIs and long-lived desktop clients.

// std
use std::{
	fs::{self, File},
	io::{ErrorKind, Write},
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	auth::AccessToken,
	store::{StoreError, TokenStore},
};

/// Persists the current token to a JSON file after each mutation.
#[derive(Clone, Debug)]
pub struct FileTokenStore {
	path: PathBuf,
	inner: Arc<RwLock<Option<AccessToken>>>,
}
impl FileTokenStore {
	/// Opens (or creates) a store at the provided path, eagerly loading existing data.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let snapshot = Self::load_snapshot(&path)?;

		Ok(Self { path, inner: Arc::new(RwLock::new(snapshot)) })
	}

	/// Location of the backing file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn load_snapshot(path: &Path) -> Result<Option<AccessToken>, StoreError> {
		if !path.exists() {
			return Ok(None);
		}

		let metadata = path.metadata().map_err(|e| StoreError::Backend {
			message: format!("Failed to inspect {}: {e}", path.display()),
		})?;

		if metadata.len() == 0 {
			return Ok(None);
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;
		let token: AccessToken =
			serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
				message: format!("Failed to parse {}: {e}", path.display()),
			})?;

		token.validate()?;

		Ok(Some(token))
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn persist(&self, token: &AccessToken) -> Result<(), StoreError> {
		Self::ensure_parent_exists(&self.path)?;

		let serialized =
			serde_json::to_vec_pretty(token).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize access token: {e}"),
			})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}
}
impl TokenStore for FileTokenStore {
	fn access_token(&self) -> Option<AccessToken> {
		self.inner.read().clone()
	}

	fn save_access_token(&self, token: AccessToken) -> Result<(), StoreError> {
		token.validate()?;

		let mut guard = self.inner.write();

		self.persist(&token)?;

		*guard = Some(token);

		Ok(())
	}

	fn reset_access_token(&self) {
		let mut guard = self.inner.write();

		guard.take();

		match fs::remove_file(&self.path) {
			Ok(()) => {},
			Err(e) if e.kind() == ErrorKind::NotFound => {},
			// Reset never fails; the in-memory slot is already cleared.
			Err(_e) => {
				#[cfg(feature = "tracing")]
				tracing::warn!(path = %self.path.display(), error = %_e, "failed to delete token file");
			},
		}
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{env, process};
	// self
	use super::*;

	fn temp_path(tag: &str) -> PathBuf {
		let unique = format!(
			"oauth2_coordinator_file_store_{tag}_{}_{}.json",
			process::id(),
			OffsetDateTime::now_utc().unix_timestamp_nanos(),
		);

		env::temp_dir().join(unique)
	}

	#[test]
	fn save_and_reload_round_trip() {
		let path = temp_path("reload");
		let store = FileTokenStore::open(&path).expect("Failed to open file store.");
		let token = AccessToken::new("access-token").with_refresh_token("refresh-token");

		store.save_access_token(token.clone()).expect("Failed to save token to file store.");
		drop(store);

		let reopened = FileTokenStore::open(&path).expect("Failed to reopen file store.");
		let fetched = reopened.access_token().expect("File store lost token after reopen.");

		assert_eq!(fetched, token);

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store {}: {e}", path.display())
		});
	}

	#[test]
	fn reset_removes_backing_file() {
		let path = temp_path("reset");
		let store = FileTokenStore::open(&path).expect("Failed to open file store.");

		store.save_access_token(AccessToken::new("short-lived")).expect("Failed to save token.");

		assert!(path.exists());

		store.reset_access_token();
		store.reset_access_token();

		assert!(!path.exists());
		assert!(store.access_token().is_none());
		assert!(
			FileTokenStore::open(&path).expect("Failed to reopen file store.").access_token().is_none()
		);
	}

	#[test]
	fn corrupt_file_is_reported() {
		let path = temp_path("corrupt");

		fs::write(&path, b"{not json").expect("Failed to write corrupt fixture.");

		let err = FileTokenStore::open(&path).expect_err("Corrupt snapshot should be rejected.");

		assert!(matches!(err, StoreError::Serialization { .. }));

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store {}: {e}", path.display())
		});
	}
}
