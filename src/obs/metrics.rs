// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::obs::{OperationKind, Outcome};

/// Records an operation outcome via the global metrics recorder (when enabled).
pub fn record_outcome(kind: OperationKind, outcome: Outcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"payrail_operation_total",
			"operation" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Thread-safe counters for transport activity on one client (shared by its clones).
#[derive(Debug, Default)]
pub struct TransportMetrics {
	requests: AtomicU64,
	retries: AtomicU64,
	reauthentications: AtomicU64,
	failures: AtomicU64,
}
impl TransportMetrics {
	/// Returns the number of logical requests started.
	pub fn requests(&self) -> u64 {
		self.requests.load(Ordering::Relaxed)
	}

	/// Returns the number of retry attempts (dispatches after the first).
	pub fn retries(&self) -> u64 {
		self.retries.load(Ordering::Relaxed)
	}

	/// Returns the number of successful token endpoint exchanges.
	pub fn reauthentications(&self) -> u64 {
		self.reauthentications.load(Ordering::Relaxed)
	}

	/// Returns the number of requests that surfaced an error.
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	pub(crate) fn record_request(&self) {
		self.requests.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_retry(&self) {
		self.retries.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_reauthentication(&self) {
		self.reauthentications.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}
}
