// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for coordinator activity.
#[derive(Debug, Default)]
pub struct CoordinatorMetrics {
	refresh_attempts: AtomicU64,
	refresh_successes: AtomicU64,
	refresh_failures: AtomicU64,
	queued: AtomicU64,
	replayed: AtomicU64,
	cancelled: AtomicU64,
}
impl CoordinatorMetrics {
	/// Returns the number of refresh calls started.
	pub fn refresh_attempts(&self) -> u64 {
		self.refresh_attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of refreshes whose token was saved.
	pub fn refresh_successes(&self) -> u64 {
		self.refresh_successes.load(Ordering::Relaxed)
	}

	/// Returns the number of failed refreshes.
	pub fn refresh_failures(&self) -> u64 {
		self.refresh_failures.load(Ordering::Relaxed)
	}

	/// Returns the number of requests deferred into the pending queue.
	pub fn queued(&self) -> u64 {
		self.queued.load(Ordering::Relaxed)
	}

	/// Returns the number of queued requests re-submitted after a refresh or resume.
	pub fn replayed(&self) -> u64 {
		self.replayed.load(Ordering::Relaxed)
	}

	/// Returns the number of queued requests discarded through `cancel_all_pending`.
	pub fn cancelled(&self) -> u64 {
		self.cancelled.load(Ordering::Relaxed)
	}

	pub(crate) fn record_refresh_attempt(&self) {
		self.refresh_attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh_success(&self) {
		self.refresh_successes.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh_failure(&self) {
		self.refresh_failures.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_queued(&self) {
		self.queued.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_replayed(&self, count: usize) {
		self.replayed.fetch_add(count as u64, Ordering::Relaxed);
	}

	pub(crate) fn record_cancelled(&self, count: usize) {
		self.cancelled.fetch_add(count as u64, Ordering::Relaxed);
	}
}
