//! FIFO queue of requests deferred while a refresh is outstanding.
//!
//! Mutation happens under the coordinator lock; [`PendingQueue::drain`] hands the entries out
//! as a [`Drained`] batch that is resumed or failed after the lock is released, so replayed
//! requests can re-enter the coordinator.

// self
use crate::{
	_prelude::*,
	coordinator::handle::Ticket,
	request::RequestDescriptor,
};

/// One deferred request.
pub(crate) struct PendingRequest<R> {
	descriptor: RequestDescriptor<R>,
	ticket: Arc<Ticket>,
}
impl<R> PendingRequest<R> {
	pub(crate) fn new(descriptor: RequestDescriptor<R>, ticket: Arc<Ticket>) -> Self {
		Self { descriptor, ticket }
	}

	pub(crate) fn id(&self) -> u64 {
		self.ticket.id()
	}

	pub(crate) fn is_cancelled(&self) -> bool {
		self.ticket.is_cancelled()
	}
}

/// Insertion-ordered pending requests.
pub(crate) struct PendingQueue<R> {
	entries: VecDeque<PendingRequest<R>>,
}
impl<R> PendingQueue<R> {
	pub(crate) fn new() -> Self {
		Self { entries: VecDeque::new() }
	}

	pub(crate) fn len(&self) -> usize {
		self.entries.len()
	}

	pub(crate) fn enqueue(&mut self, entry: PendingRequest<R>) {
		self.entries.push_back(entry);
	}

	/// Marks the entry cancelled and removes it; returns `false` if it is not queued.
	pub(crate) fn cancel(&mut self, id: u64) -> bool {
		let Some(position) = self.entries.iter().position(|entry| entry.id() == id) else {
			return false;
		};

		if let Some(entry) = self.entries.remove(position) {
			entry.ticket.mark_cancelled();
		}

		true
	}

	/// Removes every entry, preserving order.
	pub(crate) fn drain(&mut self) -> Drained<R> {
		Drained(self.entries.drain(..).collect())
	}
}
impl<R> Drop for PendingQueue<R> {
	fn drop(&mut self) {
		self.drain().cancel_all();
	}
}

/// Entries taken out of the queue, to be processed outside the coordinator lock.
#[must_use = "drained requests must be resumed or failed"]
pub(crate) struct Drained<R>(Vec<PendingRequest<R>>);
impl<R> Drained<R> {
	#[cfg(any(test, feature = "tracing"))]
	pub(crate) fn len(&self) -> usize {
		self.0.len()
	}

	/// Flags every entry as replayed after a successful refresh.
	pub(crate) fn mark_refreshed(&self) {
		for entry in &self.0 {
			entry.ticket.mark_refreshed();
		}
	}

	/// Hands each live entry to `resume` in FIFO order; returns how many were resumed.
	pub(crate) fn resume_all<F>(self, mut resume: F) -> usize
	where
		F: FnMut(RequestDescriptor<R>, Arc<Ticket>),
	{
		let mut resumed = 0;

		for entry in self.0 {
			if entry.is_cancelled() {
				continue;
			}

			resume(entry.descriptor, entry.ticket);

			resumed += 1;
		}

		resumed
	}

	/// Delivers a terminal error to each live entry; returns how many callbacks ran.
	pub(crate) fn fail_all<F>(self, mut error: F) -> usize
	where
		F: FnMut() -> Error,
	{
		let mut failed = 0;

		for entry in self.0 {
			if entry.is_cancelled() {
				continue;
			}
			if entry.ticket.resolve(Err(error())) {
				failed += 1;
			}
		}

		failed
	}

	/// Cancels each live entry and delivers [`Error::Cancelled`]; returns how many callbacks ran.
	pub(crate) fn cancel_all(self) -> usize {
		let mut cancelled = 0;

		for entry in self.0 {
			if !entry.ticket.mark_cancelled() {
				continue;
			}
			if entry.ticket.resolve(Err(Error::Cancelled)) {
				cancelled += 1;
			}
		}

		cancelled
	}
}
