//! Per-call request descriptors.
//!
//! A [`RequestDescriptor`] pairs a transport target with the declarative properties the
//! coordinator branches on: whether the call needs a bearer credential, how a successful
//! response affects the token store, and how failures are classified as authentication
//! challenges.

pub mod validation;

pub use validation::*;

// self
use crate::{_prelude::*, http::ProgressSink};

/// Whether a call must carry a valid access token.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Authorization {
	/// Public call; never deferred and never triggers a refresh.
	None,
	/// Protected call; queued while a refresh is outstanding.
	#[default]
	Required,
}

/// Effect a successful response has on the token store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenEffect {
	/// Leave the store untouched.
	#[default]
	Noop,
	/// Parse the response body as an access token and save it.
	Save,
	/// Clear the store (e.g., logout).
	Reset,
}

/// Immutable description of one logical call.
#[derive(Clone)]
pub struct RequestDescriptor<R> {
	/// Transport-specific target.
	pub target: R,
	/// Authorization requirement.
	pub authorization: Authorization,
	/// Token store effect applied on success.
	pub token_effect: TokenEffect,
	/// Challenge classification; `None` uses the coordinator default.
	pub validation: Option<ChallengeValidation>,
	/// Optional progress sink forwarded to the transport.
	pub progress: Option<ProgressSink>,
}
impl<R> RequestDescriptor<R> {
	/// Creates a descriptor with explicit authorization and token effect.
	pub fn new(target: R, authorization: Authorization, token_effect: TokenEffect) -> Self {
		Self { target, authorization, token_effect, validation: None, progress: None }
	}

	/// Protected call that needs a bearer credential.
	pub fn authorized(target: R) -> Self {
		Self::new(target, Authorization::Required, TokenEffect::Noop)
	}

	/// Public call that never needs a credential.
	pub fn public(target: R) -> Self {
		Self::new(target, Authorization::None, TokenEffect::Noop)
	}

	/// Saves the response body as the new access token on success.
	pub fn save_token(mut self) -> Self {
		self.token_effect = TokenEffect::Save;

		self
	}

	/// Clears the token store on success.
	pub fn reset_token(mut self) -> Self {
		self.token_effect = TokenEffect::Reset;

		self
	}

	/// Overrides challenge classification for this call.
	pub fn with_validation(mut self, validation: ChallengeValidation) -> Self {
		self.validation = Some(validation);

		self
	}

	/// Forwards transfer progress to `sink`.
	pub fn with_progress<F>(mut self, sink: F) -> Self
	where
		F: 'static + Send + Sync + Fn(crate::http::Progress),
	{
		self.progress = Some(Arc::new(sink));

		self
	}

	/// Returns `true` when the call needs a bearer credential.
	pub fn requires_authorization(&self) -> bool {
		matches!(self.authorization, Authorization::Required)
	}
}
impl<R> Debug for RequestDescriptor<R>
where
	R: Debug,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RequestDescriptor")
			.field("target", &self.target)
			.field("authorization", &self.authorization)
			.field("token_effect", &self.token_effect)
			.field("validation", &self.validation)
			.field("progress", &self.progress.is_some())
			.finish()
	}
}
