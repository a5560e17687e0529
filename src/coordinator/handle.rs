//! Per-request completion slot and the caller-facing cancellation handle.

// std
use std::{
	sync::{
		Weak,
		atomic::{AtomicBool, Ordering},
	},
	task::{Context, Poll},
};
// crates.io
use tokio::sync::oneshot;
// self
use crate::{
	_prelude::*,
	http::{CancelHandle, Response},
	obs::{self, Operation, OperationOutcome, debug_event},
};

pub(crate) type Callback = Box<dyn FnOnce(Result<Response>) + Send>;

/// Removes a queued entry from its coordinator.
pub(crate) trait Withdraw
where
	Self: Send + Sync,
{
	/// Drops the queued entry for `id`, returning `true` if it was still queued.
	fn withdraw(&self, id: u64) -> bool;
}

/// Shared state of one submitted request across queueing, replays, and cancellation.
pub(crate) struct Ticket {
	id: u64,
	callback: Mutex<Option<Callback>>,
	cancelled: AtomicBool,
	refreshed: AtomicBool,
	in_flight: Mutex<Option<CancelHandle>>,
}
impl Ticket {
	pub(crate) fn new(id: u64, callback: Callback) -> Arc<Self> {
		Arc::new(Self {
			id,
			callback: Mutex::new(Some(callback)),
			cancelled: AtomicBool::new(false),
			refreshed: AtomicBool::new(false),
			in_flight: Mutex::new(None),
		})
	}

	pub(crate) fn id(&self) -> u64 {
		self.id
	}

	pub(crate) fn is_cancelled(&self) -> bool {
		self.cancelled.load(Ordering::SeqCst)
	}

	pub(crate) fn is_finished(&self) -> bool {
		self.callback.lock().is_none()
	}

	/// Flags the ticket as cancelled; returns `false` if it already was.
	pub(crate) fn mark_cancelled(&self) -> bool {
		!self.cancelled.swap(true, Ordering::SeqCst)
	}

	/// Records that the request waited on a refresh that succeeded.
	pub(crate) fn mark_refreshed(&self) {
		self.refreshed.store(true, Ordering::SeqCst);
	}

	/// Returns `true` if the request was already replayed with a refreshed credential.
	pub(crate) fn was_refreshed(&self) -> bool {
		self.refreshed.load(Ordering::SeqCst)
	}

	/// Delivers the terminal outcome; later calls are ignored and return `false`.
	pub(crate) fn resolve(&self, outcome: Result<Response>) -> bool {
		// Take the callback before invoking it so the slot lock is not held by user code.
		let callback = self.callback.lock().take();

		match callback {
			Some(callback) => {
				callback(outcome);

				true
			},
			None => false,
		}
	}

	/// Records the transport handle of the current attempt.
	pub(crate) fn attach(&self, handle: CancelHandle) {
		let mut slot = self.in_flight.lock();

		if self.is_cancelled() {
			drop(slot);
			handle.cancel();

			return;
		}

		*slot = Some(handle);
	}

	pub(crate) fn detach(&self) -> Option<CancelHandle> {
		self.in_flight.lock().take()
	}
}
impl Drop for Ticket {
	fn drop(&mut self) {
		// Nothing can resolve the slot any more.
		if let Some(callback) = self.callback.get_mut().take() {
			self.cancelled.store(true, Ordering::SeqCst);
			callback(Err(Error::Cancelled));
		}
	}
}
impl Debug for Ticket {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Ticket")
			.field("id", &self.id)
			.field("cancelled", &self.is_cancelled())
			.field("finished", &self.is_finished())
			.finish()
	}
}

/// Handle returned by [`Coordinator::submit`](crate::Coordinator::submit).
///
/// Cancelling removes the request from the pending queue or forwards the cancellation to the
/// transport, then delivers [`Error::Cancelled`] unless an outcome was already delivered.
/// Cancellation never affects the refresh call or other requests.
#[derive(Clone)]
pub struct RequestHandle {
	ticket: Arc<Ticket>,
	owner: Weak<dyn Withdraw>,
}
impl RequestHandle {
	pub(crate) fn new(ticket: Arc<Ticket>, owner: Weak<dyn Withdraw>) -> Self {
		Self { ticket, owner }
	}

	/// Coordinator-assigned request identifier.
	pub fn id(&self) -> u64 {
		self.ticket.id()
	}

	/// Cancels the request. Idempotent; a no-op once the outcome has been delivered.
	pub fn cancel(&self) {
		if self.ticket.is_finished() || !self.ticket.mark_cancelled() {
			return;
		}

		if let Some(owner) = self.owner.upgrade() {
			owner.withdraw(self.ticket.id());
		}
		if let Some(handle) = self.ticket.detach() {
			handle.cancel();
		}
		if self.ticket.resolve(Err(Error::Cancelled)) {
			obs::record_outcome(Operation::Submit, OperationOutcome::Cancelled);
			debug_event!(id = self.ticket.id(), "request cancelled");
		}
	}

	/// Returns `true` once the terminal outcome has been delivered.
	pub fn is_finished(&self) -> bool {
		self.ticket.is_finished()
	}

	/// Returns `true` if [`cancel`](Self::cancel) was called before the outcome was delivered.
	pub fn is_cancelled(&self) -> bool {
		self.ticket.is_cancelled()
	}
}
impl Debug for RequestHandle {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("RequestHandle").field(&self.ticket).finish()
	}
}

/// Future returned by [`Coordinator::send`](crate::Coordinator::send).
///
/// Dropping the future before it resolves cancels the request.
#[derive(Debug)]
pub struct ResponseFuture {
	receiver: oneshot::Receiver<Result<Response>>,
	handle: RequestHandle,
}
impl ResponseFuture {
	pub(crate) fn new(receiver: oneshot::Receiver<Result<Response>>, handle: RequestHandle) -> Self {
		Self { receiver, handle }
	}

	/// Handle of the underlying request.
	pub fn handle(&self) -> &RequestHandle {
		&self.handle
	}
}
impl Future for ResponseFuture {
	type Output = Result<Response>;

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		Pin::new(&mut self.receiver)
			.poll(cx)
			.map(|received| received.unwrap_or(Err(Error::Cancelled)))
	}
}
impl Drop for ResponseFuture {
	fn drop(&mut self) {
		self.handle.cancel();
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::AtomicUsize;
	// self
	use super::*;

	struct NoOwner;
	impl Withdraw for NoOwner {
		fn withdraw(&self, _: u64) -> bool {
			false
		}
	}

	fn counting_ticket(calls: &Arc<AtomicUsize>) -> Arc<Ticket> {
		let calls = calls.clone();

		Ticket::new(
			7,
			Box::new(move |_| {
				calls.fetch_add(1, Ordering::SeqCst);
			}),
		)
	}

	fn orphan_handle(ticket: Arc<Ticket>) -> RequestHandle {
		let owner: Weak<dyn Withdraw> = Weak::<NoOwner>::new();

		RequestHandle::new(ticket, owner)
	}

	#[test]
	fn ticket_resolves_once() {
		let calls = Arc::new(AtomicUsize::new(0));
		let ticket = counting_ticket(&calls);

		assert!(ticket.resolve(Ok(Response::new(200, ""))));
		assert!(!ticket.resolve(Err(Error::Cancelled)));
		assert!(ticket.is_finished());
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[test]
	fn cancel_forwards_to_transport_and_delivers_once() {
		let calls = Arc::new(AtomicUsize::new(0));
		let ticket = counting_ticket(&calls);
		let forwarded = Arc::new(AtomicUsize::new(0));
		let counter = forwarded.clone();

		ticket.attach(Box::new(move || {
			counter.fetch_add(1, Ordering::SeqCst);
		}));

		let handle = orphan_handle(ticket.clone());

		handle.cancel();
		handle.cancel();

		assert!(handle.is_cancelled());
		assert!(handle.is_finished());
		assert_eq!(forwarded.load(Ordering::SeqCst), 1);
		assert_eq!(calls.load(Ordering::SeqCst), 1);
		assert!(!ticket.resolve(Ok(Response::new(200, ""))));
	}

	#[test]
	fn attach_after_cancel_cancels_immediately() {
		let calls = Arc::new(AtomicUsize::new(0));
		let ticket = counting_ticket(&calls);
		let forwarded = Arc::new(AtomicUsize::new(0));
		let counter = forwarded.clone();

		orphan_handle(ticket.clone()).cancel();
		ticket.attach(Box::new(move || {
			counter.fetch_add(1, Ordering::SeqCst);
		}));

		assert_eq!(forwarded.load(Ordering::SeqCst), 1);
		assert!(ticket.detach().is_none());
	}

	#[test]
	fn dropping_an_unresolved_ticket_delivers_cancelled() {
		let seen = Arc::new(Mutex::new(Vec::new()));
		let sink = seen.clone();
		let ticket = Ticket::new(
			9,
			Box::new(move |outcome: Result<Response>| {
				sink.lock().push(matches!(outcome, Err(Error::Cancelled)));
			}),
		);

		drop(ticket);

		assert_eq!(*seen.lock(), [true]);
	}

	#[test]
	fn dropping_a_resolved_ticket_stays_quiet() {
		let calls = Arc::new(AtomicUsize::new(0));
		let ticket = counting_ticket(&calls);

		ticket.resolve(Ok(Response::new(200, "")));
		drop(ticket);

		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[test]
	fn cancel_after_finish_is_a_noop() {
		let calls = Arc::new(AtomicUsize::new(0));
		let ticket = counting_ticket(&calls);
		let handle = orphan_handle(ticket.clone());

		ticket.resolve(Ok(Response::new(204, "")));
		handle.cancel();

		assert!(!handle.is_cancelled());
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}
}
