//! Authentication-challenge classification strategies.

// self
use crate::{
	_prelude::*,
	error::TransportError,
	http::{Failure, Response},
};

type ChallengePredicate = dyn Fn(Option<&Response>, &TransportError) -> bool + Send + Sync;

/// Decides whether a failed call means "the credential is invalid, refresh it".
///
/// Failures classified as challenges enter the refresh path; everything else is passed to the
/// caller untouched.
#[derive(Clone)]
pub enum ChallengeValidation {
	/// Any of these HTTP statuses is a challenge.
	StatusCodes(Vec<u16>),
	/// Arbitrary predicate over the response (if any) and the transport error.
	Predicate(Arc<ChallengePredicate>),
}
impl ChallengeValidation {
	/// HTTP 401 Unauthorized.
	pub const UNAUTHORIZED: u16 = 401;

	/// Treats the listed statuses as challenges.
	pub fn status_codes(codes: impl IntoIterator<Item = u16>) -> Self {
		Self::StatusCodes(codes.into_iter().collect())
	}

	/// Wraps a custom predicate.
	pub fn predicate<F>(f: F) -> Self
	where
		F: 'static + Send + Sync + Fn(Option<&Response>, &TransportError) -> bool,
	{
		Self::Predicate(Arc::new(f))
	}

	/// Classifies `failure`.
	pub fn is_challenge(&self, failure: &Failure) -> bool {
		match self {
			Self::StatusCodes(codes) => failure.status().is_some_and(|status| codes.contains(&status)),
			Self::Predicate(f) => f(failure.response.as_ref(), &failure.error),
		}
	}
}
impl Default for ChallengeValidation {
	fn default() -> Self {
		Self::StatusCodes(vec![Self::UNAUTHORIZED])
	}
}
impl Debug for ChallengeValidation {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::StatusCodes(codes) => f.debug_tuple("StatusCodes").field(codes).finish(),
			Self::Predicate(_) => f.write_str("Predicate(..)"),
		}
	}
}
