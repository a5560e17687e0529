//! Optional observability helpers for coordinator operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `oauth2_coordinator.op` with the `op` and
//!   `stage` fields, plus debug events for queueing, refresh transitions, and cancellation.
//! - Enable `metrics` to increment the `oauth2_coordinator_op_total` counter for every recorded
//!   outcome, labeled by `op` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Coordinator operations observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
	/// A caller submission, including replays after a refresh.
	Submit,
	/// The single-flight token refresh.
	Refresh,
	/// Draining the pending queue (replay, failure, or administrative discard).
	Drain,
}
impl Operation {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Operation::Submit => "submit",
			Operation::Refresh => "refresh",
			Operation::Drain => "drain",
		}
	}
}
impl Display for Operation {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded per operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationOutcome {
	/// Entry to the operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure delivered to the caller.
	Failure,
	/// The request was deferred into the pending queue.
	Queued,
	/// The request was cancelled by its caller.
	Cancelled,
}
impl OperationOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationOutcome::Attempt => "attempt",
			OperationOutcome::Success => "success",
			OperationOutcome::Failure => "failure",
			OperationOutcome::Queued => "queued",
			OperationOutcome::Cancelled => "cancelled",
		}
	}
}
impl Display for OperationOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
