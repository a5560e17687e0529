//! Coordinator-level error types shared across the engine, transports, and stores.

// self
use crate::_prelude::*;

/// Coordinator-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type SharedError = Arc<dyn StdError + Send + Sync>;

/// Canonical coordinator error delivered to request callbacks.
#[derive(Clone, Debug, ThisError)]
pub enum Error {
	/// OAuth protocol-level failure, reported by the server or synthesized locally.
	#[error(transparent)]
	OAuth(#[from] OAuthError),
	/// Transport failure passed through unchanged.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),

	/// Token-issuing response could not be deserialized into an access token.
	#[error("Token response is malformed.")]
	TokenResponseParse {
		/// Structured parsing failure.
		#[source]
		source: Arc<serde_path_to_error::Error<serde_json::Error>>,
		/// HTTP status code of the response, when available.
		status: Option<u16>,
	},
	/// The caller cancelled the request before it produced an outcome.
	#[error("Request was cancelled.")]
	Cancelled,
}
impl Error {
	/// Shorthand for [`OAuthError::UnauthorizedClient`].
	pub fn unauthorized_client(reason: impl Into<String>) -> Self {
		OAuthError::UnauthorizedClient { reason: reason.into() }.into()
	}

	/// Returns `true` for [`OAuthError::UnauthorizedClient`].
	pub fn is_unauthorized_client(&self) -> bool {
		matches!(self, Self::OAuth(OAuthError::UnauthorizedClient { .. }))
	}

	/// Returns `true` when the error is a cancellation, local or transport-reported.
	pub fn is_cancelled(&self) -> bool {
		matches!(self, Self::Cancelled | Self::Transport(TransportError::Cancelled))
	}
}

/// OAuth 2.0 error kinds (RFC 6749 §4.1.2.1 / §5.2) understood by the coordinator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum OAuthError {
	/// The request is missing a parameter or is otherwise malformed.
	#[error("Request is invalid: {reason}.")]
	InvalidRequest {
		/// Server- or coordinator-supplied reason string.
		reason: String,
	},
	/// The client is not authorized, or holds no usable credentials.
	#[error("Client is unauthorized: {reason}.")]
	UnauthorizedClient {
		/// Server- or coordinator-supplied reason string.
		reason: String,
	},
	/// The server does not support the requested response type.
	#[error("Response type is unsupported: {reason}.")]
	UnsupportedResponseType {
		/// Server- or coordinator-supplied reason string.
		reason: String,
	},
	/// The requested scope is invalid, unknown, or malformed.
	#[error("Scope is invalid: {reason}.")]
	InvalidScope {
		/// Server- or coordinator-supplied reason string.
		reason: String,
	},
	/// The authorization server hit an unexpected condition.
	#[error("Authorization server failed: {reason}.")]
	ServerError {
		/// Server- or coordinator-supplied reason string.
		reason: String,
	},
	/// The authorization server is temporarily overloaded or under maintenance.
	#[error("Authorization server is temporarily unavailable: {reason}.")]
	TemporarilyUnavailable {
		/// Server- or coordinator-supplied reason string.
		reason: String,
	},
}
impl OAuthError {
	/// Maps an RFC 6749 `error` code (plus optional description) into a known kind.
	///
	/// `invalid_client` and `invalid_grant` are folded into [`OAuthError::UnauthorizedClient`]
	/// because both mean the stored credentials can no longer be used.
	pub fn from_code(code: &str, description: Option<&str>) -> Option<Self> {
		let reason = description.unwrap_or(code).to_owned();
		let error = match code {
			"invalid_request" => Self::InvalidRequest { reason },
			"unauthorized_client" | "invalid_client" | "invalid_grant" =>
				Self::UnauthorizedClient { reason },
			"unsupported_response_type" => Self::UnsupportedResponseType { reason },
			"invalid_scope" => Self::InvalidScope { reason },
			"server_error" => Self::ServerError { reason },
			"temporarily_unavailable" => Self::TemporarilyUnavailable { reason },
			_ => return None,
		};

		Some(error)
	}

	/// Returns the RFC 6749 wire code for this kind.
	pub const fn code(&self) -> &'static str {
		match self {
			Self::InvalidRequest { .. } => "invalid_request",
			Self::UnauthorizedClient { .. } => "unauthorized_client",
			Self::UnsupportedResponseType { .. } => "unsupported_response_type",
			Self::InvalidScope { .. } => "invalid_scope",
			Self::ServerError { .. } => "server_error",
			Self::TemporarilyUnavailable { .. } => "temporarily_unavailable",
		}
	}
}

/// Transport-level failures reported through [`crate::http::Completion`].
#[derive(Clone, Debug, ThisError)]
pub enum TransportError {
	/// Server answered with a non-success HTTP status.
	#[error("Server responded with HTTP status {status}.")]
	Status {
		/// HTTP status code.
		status: u16,
	},
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while executing the request.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: SharedError,
	},
	/// Transport stopped the request because it was cancelled.
	#[error("Transport cancelled the request.")]
	Cancelled,
	/// Transport dropped the completion slot without reporting an outcome.
	#[error("Transport abandoned the request without an outcome.")]
	Abandoned,
	/// Any other transport-specific failure.
	#[error("Transport failed: {message}.")]
	Other {
		/// Transport-supplied message.
		message: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Network { source: Arc::new(src) }
	}

	/// Returns the HTTP status code carried by [`TransportError::Status`].
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Status { status } => Some(*status),
			_ => None,
		}
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
