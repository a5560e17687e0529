//! Immutable access token value produced by token-issuing responses.

// self
use crate::{_prelude::*, auth::TokenSecret, store::StoreError};

/// Access token issued by the authorization server (RFC 6749 §5.1).
///
/// Values are never mutated in place; a refresh replaces the stored token wholesale.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
	/// Bearer credential attached to protected requests.
	pub access_token: TokenSecret,
	/// Token type reported by the server (`Bearer` when absent).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub token_type: Option<String>,
	/// Longer-lived credential used to mint a new access token.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refresh_token: Option<TokenSecret>,
	/// Lifetime in seconds, relative to [`AccessToken::issued_at`].
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expires_in: Option<u64>,
	/// Space-delimited scopes granted to the token.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub scope: Option<String>,
	/// Instant the token was received; stamped when parsing a response.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub issued_at: Option<OffsetDateTime>,
}
impl AccessToken {
	const DEFAULT_TOKEN_TYPE: &'static str = "Bearer";

	/// Creates a token holding only the access credential.
	pub fn new(access_token: impl Into<String>) -> Self {
		Self {
			access_token: TokenSecret::new(access_token),
			token_type: None,
			refresh_token: None,
			expires_in: None,
			scope: None,
			issued_at: None,
		}
	}

	/// Parses a token endpoint JSON body, stamping `issued_at` with the current clock.
	pub fn from_json(body: &[u8], status: Option<u16>) -> Result<Self> {
		let mut de = serde_json::Deserializer::from_slice(body);
		let mut token: Self = serde_path_to_error::deserialize(&mut de)
			.map_err(|source| Error::TokenResponseParse { source: Arc::new(source), status })?;

		if token.issued_at.is_none() {
			token.issued_at = Some(OffsetDateTime::now_utc());
		}

		Ok(token)
	}

	/// Sets the token type.
	pub fn with_token_type(mut self, token_type: impl Into<String>) -> Self {
		self.token_type = Some(token_type.into());

		self
	}

	/// Sets the refresh credential.
	pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
		self.refresh_token = Some(TokenSecret::new(refresh_token));

		self
	}

	/// Sets the lifetime in seconds.
	pub fn with_expires_in(mut self, seconds: u64) -> Self {
		self.expires_in = Some(seconds);

		self
	}

	/// Sets the granted scope string.
	pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
		self.scope = Some(scope.into());

		self
	}

	/// Sets the issued-at instant.
	pub fn with_issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Returns `true` if a refresh credential is present and non-blank.
	pub fn has_refresh_token(&self) -> bool {
		self.refresh_token.as_ref().is_some_and(|secret| !secret.is_blank())
	}

	/// Returns `true` if both tokens carry the same access credential.
	pub fn same_credential(&self, other: &Self) -> bool {
		self.access_token == other.access_token
	}

	/// Formats the value for an `Authorization` header, e.g. `Bearer abc`.
	pub fn authorization_header(&self) -> String {
		let kind = self
			.token_type
			.as_deref()
			.filter(|kind| !kind.is_empty())
			.unwrap_or(Self::DEFAULT_TOKEN_TYPE);

		// Servers often answer `bearer`; always send the canonical casing.
		if kind.eq_ignore_ascii_case(Self::DEFAULT_TOKEN_TYPE) {
			format!("{} {}", Self::DEFAULT_TOKEN_TYPE, self.access_token.expose())
		} else {
			format!("{kind} {}", self.access_token.expose())
		}
	}

	/// Absolute expiry, when both `issued_at` and `expires_in` are known.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		let issued_at = self.issued_at?;
		let seconds = i64::try_from(self.expires_in?).ok()?;

		issued_at.checked_add(Duration::seconds(seconds))
	}

	/// Returns `true` if the token has a known expiry at or before `instant`.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		self.expires_at().is_some_and(|expires_at| instant >= expires_at)
	}

	/// Convenience helper that checks expiry against the current UTC instant.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}

	/// Checks the invariants every stored token must satisfy.
	pub fn validate(&self) -> Result<(), StoreError> {
		if self.access_token.is_blank() {
			return Err(StoreError::InvalidToken { reason: "access token is empty".into() });
		}
		if self.token_type.as_deref().is_some_and(|kind| kind.trim().is_empty()) {
			return Err(StoreError::InvalidToken { reason: "token type is empty".into() });
		}

		Ok(())
	}
}
impl Debug for AccessToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AccessToken")
			.field("access_token", &"<redacted>")
			.field("token_type", &self.token_type)
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("expires_in", &self.expires_in)
			.field("scope", &self.scope)
			.field("issued_at", &self.issued_at)
			.finish()
	}
}
