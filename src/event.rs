//! Lifecycle events published by the coordinator and the request keep-alive hook.

// self
use crate::_prelude::*;

/// Refresh lifecycle events.
#[derive(Clone, Debug)]
pub enum AuthEvent {
	/// A protected call failed with an authentication challenge and a refresh is about to start.
	ChallengeReceived,
	/// The refresh call has been issued.
	RefreshStarted,
	/// The refreshed token was saved; queued calls are being replayed.
	RefreshFinished,
	/// The refresh failed; the store was reset and queued calls were failed.
	RefreshFailed(Error),
}
impl AuthEvent {
	/// Returns a stable label suitable for logs or metric fields.
	pub const fn as_str(&self) -> &'static str {
		match self {
			Self::ChallengeReceived => "challenge_received",
			Self::RefreshStarted => "refresh_started",
			Self::RefreshFinished => "refresh_finished",
			Self::RefreshFailed(_) => "refresh_failed",
		}
	}
}
impl Display for AuthEvent {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Receives [`AuthEvent`]s.
///
/// Called outside the coordinator lock, from whichever thread drove the transition; re-entering
/// the coordinator from here is allowed.
pub trait EventNotifier
where
	Self: Send + Sync,
{
	/// Publishes `event`.
	fn emit(&self, event: &AuthEvent);
}
impl<F> EventNotifier for F
where
	F: Send + Sync + Fn(&AuthEvent),
{
	fn emit(&self, event: &AuthEvent) {
		self(event)
	}
}

/// Notifier that drops every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopNotifier;
impl EventNotifier for NoopNotifier {
	fn emit(&self, _: &AuthEvent) {}
}

/// Application hook invoked around every transport call (e.g., to keep a mobile process alive
/// while requests are outstanding).
pub trait LifecycleHook
where
	Self: Send + Sync,
{
	/// A transport call is about to start.
	fn request_started(&self);

	/// A transport call produced its outcome.
	fn request_finished(&self);
}
