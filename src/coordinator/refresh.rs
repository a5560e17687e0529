//! Single-flight refresh and the transitions out of the `Refreshing` phase.
//!
//! Only the caller that flipped the coordinator into `Refreshing` (with the in-flight latch
//! set) reaches [`Coordinator::begin_refresh`]. The refresh call is built by the configured
//! [`RefreshRequestFactory`](crate::coordinator::RefreshRequestFactory), executed on the same
//! transport, and its response is parsed and saved as the new access token. When the server
//! omits a refresh token the previous one is carried over. The outcome is applied exactly once:
//! success replays the queue in FIFO order, failure resets the store and fails the queue with
//! `unauthorized_client`. A `Reset` token effect applied while the refresh is outstanding turns
//! its result into a failure.

// std
use std::mem;
// self
use crate::{
	_prelude::*,
	auth::AccessToken,
	coordinator::{Coordinator, Phase},
	event::AuthEvent,
	http::{Completion, Outcome, Transport},
	obs::{self, Operation, OperationOutcome, OperationSpan, debug_event},
	request::RequestDescriptor,
};

impl<T> Coordinator<T>
where
	T: Transport,
{
	pub(super) fn begin_refresh(&self, current: AccessToken) {
		const OP: Operation = Operation::Refresh;

		let _span = OperationSpan::new(OP, "begin_refresh").entered();

		self.inner.metrics.record_refresh_attempt();
		obs::record_outcome(OP, OperationOutcome::Attempt);
		self.inner.notifier.emit(&AuthEvent::RefreshStarted);

		let descriptor = match self.inner.refresh_factory.refresh_request(&current) {
			Ok(descriptor) => descriptor,
			Err(e) => {
				self.finish_refresh(Err(e));

				return;
			},
		};

		debug_event!("refresh call issued");

		self.execute_refresh(descriptor, current);
	}

	fn execute_refresh(&self, descriptor: RequestDescriptor<T::Target>, current: AccessToken) {
		let credential = descriptor.requires_authorization().then(|| current.clone());
		let this = self.clone();
		let completion = Completion::new(move |outcome| {
			this.inner.request_finished();

			let result = this.on_refresh_complete(&current, outcome);

			this.finish_refresh(result);
		});

		self.inner.request_started();

		// The refresh is never cancelled from the outside; its handle is not retained.
		let _ = self.inner.transport.execute(
			&descriptor.target,
			credential.as_ref(),
			descriptor.progress.clone(),
			completion,
		);
	}

	fn on_refresh_complete(&self, current: &AccessToken, outcome: Outcome) -> Result<()> {
		let response = match outcome {
			Ok(response) => response,
			Err(failure) => {
				let oauth = failure.response.as_ref().and_then(|response| response.oauth_error());

				return Err(match oauth {
					Some(e) => e.into(),
					None => failure.error.into(),
				});
			},
		};
		let mut token = AccessToken::from_json(&response.body, Some(response.status))?;

		if token.refresh_token.is_none() {
			token.refresh_token = current.refresh_token.clone();
		}

		let mut state = self.inner.state.lock();

		// A reset applied while the refresh was outstanding outranks its result.
		if mem::take(&mut state.reset_during_refresh) {
			return Err(Error::unauthorized_client("token was reset during the refresh"));
		}

		self.inner.store.save_access_token(token)?;

		Ok(())
	}

	fn finish_refresh(&self, result: Result<()>) {
		const OP: Operation = Operation::Refresh;

		let _span = OperationSpan::new(OP, "finish_refresh").entered();

		match result {
			Ok(()) => {
				let drained = {
					let mut state = self.inner.state.lock();

					state.phase = Phase::Authorized;
					state.refresh_in_flight = false;
					state.reset_during_refresh = false;

					state.queue.drain()
				};

				drained.mark_refreshed();
				self.inner.metrics.record_refresh_success();
				obs::record_outcome(OP, OperationOutcome::Success);
				debug_event!(pending = drained.len(), "refresh succeeded");
				self.inner.notifier.emit(&AuthEvent::RefreshFinished);
				self.replay(drained);
			},
			Err(e) => {
				self.inner.store.reset_access_token();

				let drained = {
					let mut state = self.inner.state.lock();

					state.phase = Phase::Authorized;
					state.refresh_in_flight = false;
					state.reset_during_refresh = false;

					state.queue.drain()
				};
				let _failed =
					drained.fail_all(|| Error::unauthorized_client("token refresh failed"));

				self.inner.metrics.record_refresh_failure();
				obs::record_outcome(OP, OperationOutcome::Failure);
				debug_event!(failed = _failed, error = %e, "refresh failed; store reset");
				self.inner.notifier.emit(&AuthEvent::RefreshFailed(e));
			},
		}
	}
}
