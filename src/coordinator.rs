//! Authentication coordination engine.
//!
//! [`Coordinator::submit`] routes every call through a two-phase state machine:
//!
//! - `Authorized`: protected calls run immediately with the stored access token. A failure
//!   classified as an authentication challenge queues the call and, when no refresh is in
//!   flight, starts one (single-flight, decided atomically under the coordinator lock).
//! - `Refreshing`: protected calls are queued until the refresh outcome is applied. Success
//!   saves the new token and replays the queue in FIFO order; failure resets the store and fails
//!   every queued call with `unauthorized_client`.
//!
//! Public calls ([`Authorization::None`]) bypass the state machine entirely. The coordinator
//! lock guards only the phase, the refresh latch, and the queue, and is never held while the
//! transport, a callback, or the notifier runs.

pub mod builder;

mod handle;
mod metrics;
mod queue;
mod refresh;

pub use builder::*;
pub use handle::{RequestHandle, ResponseFuture};
pub use metrics::CoordinatorMetrics;

// std
use std::sync::{
	Weak,
	atomic::{AtomicU64, Ordering},
};
// crates.io
use tokio::sync::oneshot;
// self
use crate::{
	_prelude::*,
	auth::AccessToken,
	event::{AuthEvent, EventNotifier, LifecycleHook},
	http::{Completion, Outcome, Response, Transport},
	obs::{self, Operation, OperationOutcome, OperationSpan, debug_event},
	request::{ChallengeValidation, RequestDescriptor, TokenEffect},
	store::TokenStore,
};
use handle::{Ticket, Withdraw};
use queue::{Drained, PendingQueue, PendingRequest};

/// Coordinator phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
	/// Protected calls execute immediately.
	Authorized,
	/// Protected calls are queued (refresh outstanding or suspended).
	Refreshing,
}

struct State<R> {
	phase: Phase,
	/// Single-flight latch; only set together with `phase = Refreshing`.
	refresh_in_flight: bool,
	/// Set when a `Reset` effect lands while the refresh is outstanding.
	reset_during_refresh: bool,
	queue: PendingQueue<R>,
}

struct Inner<T>
where
	T: Transport,
{
	transport: Arc<T>,
	store: Arc<dyn TokenStore>,
	refresh_factory: Arc<dyn RefreshRequestFactory<T::Target>>,
	notifier: Arc<dyn EventNotifier>,
	lifecycle: Option<Arc<dyn LifecycleHook>>,
	default_validation: ChallengeValidation,
	metrics: Arc<CoordinatorMetrics>,
	state: Mutex<State<T::Target>>,
	next_id: AtomicU64,
}
impl<T> Inner<T>
where
	T: Transport,
{
	fn request_started(&self) {
		if let Some(hook) = &self.lifecycle {
			hook.request_started();
		}
	}

	fn request_finished(&self) {
		if let Some(hook) = &self.lifecycle {
			hook.request_finished();
		}
	}
}
impl<T> Withdraw for Inner<T>
where
	T: Transport,
{
	fn withdraw(&self, id: u64) -> bool {
		self.state.lock().queue.cancel(id)
	}
}

enum ChallengeAction {
	Queued,
	Replay,
	FailFast,
	Rejected,
	BeginRefresh(AccessToken),
}

/// Coordinates bearer-authenticated calls over a [`Transport`].
///
/// Cloning is cheap; clones share state.
pub struct Coordinator<T>
where
	T: Transport,
{
	inner: Arc<Inner<T>>,
}
impl<T> Coordinator<T>
where
	T: Transport,
{
	/// Starts configuring a coordinator.
	pub fn builder(
		transport: impl Into<Arc<T>>,
		store: Arc<dyn TokenStore>,
		refresh_factory: impl 'static + RefreshRequestFactory<T::Target>,
	) -> CoordinatorBuilder<T> {
		CoordinatorBuilder::new(transport.into(), store, Arc::new(refresh_factory))
	}

	/// Submits a call; `callback` receives exactly one terminal outcome.
	///
	/// The callback may run on the calling thread (fast failures, synchronous transports) or on
	/// the transport's completion context.
	pub fn submit<F>(&self, descriptor: RequestDescriptor<T::Target>, callback: F) -> RequestHandle
	where
		F: 'static + Send + FnOnce(Result<Response>),
	{
		let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
		let ticket = Ticket::new(id, Box::new(callback));
		let inner: Weak<Inner<T>> = Arc::downgrade(&self.inner);
		let owner: Weak<dyn Withdraw> = inner;
		let handle = RequestHandle::new(ticket.clone(), owner);

		obs::record_outcome(Operation::Submit, OperationOutcome::Attempt);
		self.dispatch(descriptor, ticket);

		handle
	}

	/// Async form of [`submit`](Self::submit); dropping the future cancels the call.
	pub fn send(&self, descriptor: RequestDescriptor<T::Target>) -> ResponseFuture {
		let (sender, receiver) = oneshot::channel();
		let handle = self.submit(descriptor, move |outcome| {
			let _ = sender.send(outcome);
		});

		ResponseFuture::new(receiver, handle)
	}

	/// Forces queuing of protected calls until [`resume`](Self::resume).
	pub fn suspend(&self) {
		let mut state = self.inner.state.lock();

		if state.phase == Phase::Authorized {
			state.phase = Phase::Refreshing;

			debug_event!("coordinator suspended");
		}
	}

	/// Leaves a suspension and replays queued calls in FIFO order.
	///
	/// Returns `false` without side effects when already authorized or while a refresh is in
	/// flight; the refresh outcome drains the queue in that case.
	pub fn resume(&self) -> bool {
		let drained = {
			let mut state = self.inner.state.lock();

			if state.phase == Phase::Authorized || state.refresh_in_flight {
				return false;
			}

			state.phase = Phase::Authorized;

			state.queue.drain()
		};

		self.replay(drained);

		true
	}

	/// Discards every queued call, delivering [`Error::Cancelled`]; returns how many were
	/// cancelled. The phase and any in-flight refresh are unaffected.
	pub fn cancel_all_pending(&self) -> usize {
		let _span = OperationSpan::new(Operation::Drain, "cancel_all_pending").entered();
		let drained = self.inner.state.lock().queue.drain();
		let cancelled = drained.cancel_all();

		self.inner.metrics.record_cancelled(cancelled);
		obs::record_outcome(Operation::Drain, OperationOutcome::Cancelled);
		debug_event!(cancelled, "pending queue discarded");

		cancelled
	}

	/// Current phase.
	pub fn phase(&self) -> Phase {
		self.inner.state.lock().phase
	}

	/// Returns `true` while a refresh call is outstanding.
	pub fn is_refreshing(&self) -> bool {
		self.inner.state.lock().refresh_in_flight
	}

	/// Number of queued calls.
	pub fn pending_len(&self) -> usize {
		self.inner.state.lock().queue.len()
	}

	/// Activity counters.
	pub fn metrics(&self) -> &CoordinatorMetrics {
		&self.inner.metrics
	}

	/// Token store shared with the coordinator.
	pub fn token_store(&self) -> &Arc<dyn TokenStore> {
		&self.inner.store
	}

	fn dispatch(&self, descriptor: RequestDescriptor<T::Target>, ticket: Arc<Ticket>) {
		if ticket.is_cancelled() {
			return;
		}
		if !descriptor.requires_authorization() {
			self.execute(descriptor, ticket, None);

			return;
		}

		let credential = {
			let mut state = self.inner.state.lock();

			if state.phase == Phase::Refreshing {
				state.queue.enqueue(PendingRequest::new(descriptor, ticket));
				drop(state);
				self.record_queued();

				return;
			}

			self.inner.store.access_token()
		};

		match credential {
			Some(credential) => self.execute(descriptor, ticket, Some(credential)),
			None => {
				ticket.resolve(Err(Error::unauthorized_client("no access token is stored")));
				obs::record_outcome(Operation::Submit, OperationOutcome::Failure);
			},
		}
	}

	fn execute(
		&self,
		descriptor: RequestDescriptor<T::Target>,
		ticket: Arc<Ticket>,
		credential: Option<AccessToken>,
	) {
		let target = descriptor.target.clone();
		let progress = descriptor.progress.clone();
		let sent_with = credential.clone();
		let this = self.clone();
		let owned = ticket.clone();
		let completion = Completion::new(move |outcome| {
			this.on_complete(descriptor, owned, sent_with, outcome);
		});

		self.inner.request_started();

		let handle = self.inner.transport.execute(&target, credential.as_ref(), progress, completion);

		ticket.attach(handle);
	}

	fn on_complete(
		&self,
		descriptor: RequestDescriptor<T::Target>,
		ticket: Arc<Ticket>,
		sent_with: Option<AccessToken>,
		outcome: Outcome,
	) {
		self.inner.request_finished();
		ticket.detach();

		match outcome {
			Ok(response) => match self.apply_token_effect(descriptor.token_effect, &response) {
				Ok(()) => {
					ticket.resolve(Ok(response));
					obs::record_outcome(Operation::Submit, OperationOutcome::Success);
				},
				Err(e) => {
					ticket.resolve(Err(e));
					obs::record_outcome(Operation::Submit, OperationOutcome::Failure);
				},
			},
			Err(_) if ticket.is_cancelled() => {
				ticket.resolve(Err(Error::Cancelled));
			},
			Err(failure) => {
				let validation =
					descriptor.validation.as_ref().unwrap_or(&self.inner.default_validation);

				if descriptor.requires_authorization() && validation.is_challenge(&failure) {
					self.handle_challenge(descriptor, ticket, sent_with);
				} else {
					ticket.resolve(Err(failure.error.into()));
					obs::record_outcome(Operation::Submit, OperationOutcome::Failure);
				}
			},
		}
	}

	fn apply_token_effect(&self, effect: TokenEffect, response: &Response) -> Result<()> {
		match effect {
			TokenEffect::Noop => Ok(()),
			TokenEffect::Reset => {
				let mut state = self.inner.state.lock();

				if state.refresh_in_flight {
					state.reset_during_refresh = true;
				}

				self.inner.store.reset_access_token();

				Ok(())
			},
			TokenEffect::Save => {
				let saved = AccessToken::from_json(&response.body, Some(response.status))
					.and_then(|token| self.inner.store.save_access_token(token).map_err(Error::from));

				if saved.is_err() {
					self.inner.store.reset_access_token();
				}

				saved
			},
		}
	}

	fn handle_challenge(
		&self,
		descriptor: RequestDescriptor<T::Target>,
		ticket: Arc<Ticket>,
		sent_with: Option<AccessToken>,
	) {
		let action = {
			let mut state = self.inner.state.lock();

			if state.phase == Phase::Refreshing {
				state.queue.enqueue(PendingRequest::new(descriptor, ticket));

				ChallengeAction::Queued
			} else {
				match self.inner.store.access_token() {
					// A refresh completed after this call was sent; retry with the new token.
					Some(current)
						if sent_with.as_ref().is_some_and(|sent| !sent.same_credential(&current)) =>
					{
						drop(state);
						self.dispatch(descriptor, ticket);

						ChallengeAction::Replay
					},
					// The credential this call was replayed with is already the refreshed one.
					Some(_) if ticket.was_refreshed() => {
						drop(state);
						ticket.resolve(Err(Error::unauthorized_client(
							"refreshed credential was rejected",
						)));

						ChallengeAction::Rejected
					},
					Some(current) if current.has_refresh_token() => {
						state.phase = Phase::Refreshing;
						state.refresh_in_flight = true;
						state.reset_during_refresh = false;
						state.queue.enqueue(PendingRequest::new(descriptor, ticket));

						ChallengeAction::BeginRefresh(current)
					},
					_ => {
						drop(state);
						self.inner.store.reset_access_token();
						ticket.resolve(Err(Error::unauthorized_client(
							"no refresh token is available",
						)));

						ChallengeAction::FailFast
					},
				}
			}
		};

		match action {
			ChallengeAction::Queued => self.record_queued(),
			ChallengeAction::Replay => {
				debug_event!("challenge answered with a stale token; replaying");
			},
			ChallengeAction::FailFast => {
				obs::record_outcome(Operation::Submit, OperationOutcome::Failure);
				debug_event!("challenge without refresh credential; failing fast");
			},
			ChallengeAction::Rejected => {
				obs::record_outcome(Operation::Submit, OperationOutcome::Failure);
				debug_event!("refreshed credential challenged again; not refreshing twice");
			},
			ChallengeAction::BeginRefresh(current) => {
				self.record_queued();
				self.inner.notifier.emit(&AuthEvent::ChallengeReceived);
				self.begin_refresh(current);
			},
		}
	}

	fn replay(&self, drained: Drained<T::Target>) {
		let _span = OperationSpan::new(Operation::Drain, "replay").entered();
		let replayed = drained.resume_all(|descriptor, ticket| self.dispatch(descriptor, ticket));

		self.inner.metrics.record_replayed(replayed);
		obs::record_outcome(Operation::Drain, OperationOutcome::Success);
		debug_event!(replayed, "pending queue replayed");
	}

	fn record_queued(&self) {
		self.inner.metrics.record_queued();
		obs::record_outcome(Operation::Submit, OperationOutcome::Queued);
		debug_event!("request queued until the refresh outcome is applied");
	}
}
impl<T> Clone for Coordinator<T>
where
	T: Transport,
{
	fn clone(&self) -> Self {
		Self { inner: self.inner.clone() }
	}
}
impl<T> Debug for Coordinator<T>
where
	T: Transport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let state = self.inner.state.lock();

		f.debug_struct("Coordinator")
			.field("phase", &state.phase)
			.field("refresh_in_flight", &state.refresh_in_flight)
			.field("pending", &state.queue.len())
			.finish()
	}
}
