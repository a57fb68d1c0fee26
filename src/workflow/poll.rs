//! Cooperative polling until a transaction reaches a terminal state.
//!
//! [`Client::wait_for_completion`] fetches the transaction every `interval`, reports each
//! distinct state change to the optional callback (deduplicated against the immediately
//! preceding observation), and returns as soon as a terminal state is seen. Elapsed time is
//! measured with the client's clock, so tests can drive the loop with virtual time.

// self
use crate::{
	_prelude::*,
	auth::TxnId,
	client::Client,
	http::HttpTransport,
	obs::{self, OperationKind, OperationSpan, Outcome},
	transaction::{Transaction, TransactionState},
};

type StateCallback = Box<dyn FnMut(&TransactionState) + Send>;

/// Parameters for [`Client::wait_for_completion`].
pub struct WaitOptions {
	/// Delay between polls.
	pub interval: Duration,
	/// Overall budget before giving up.
	pub timeout: Duration,
	/// State the caller already knows about; the first observation is compared against it.
	pub initial_state: Option<TransactionState>,
	on_state_change: Option<StateCallback>,
}
impl WaitOptions {
	/// Default delay between polls.
	pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(3_000);
	/// Default polling budget.
	pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(300_000);

	/// Overrides the poll interval.
	pub fn interval(mut self, interval: Duration) -> Self {
		self.interval = interval;

		self
	}

	/// Overrides the polling budget.
	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Seeds the previously observed state.
	///
	/// Without a seed the first observation only establishes the baseline.
	pub fn with_initial_state(mut self, state: TransactionState) -> Self {
		self.initial_state = Some(state);

		self
	}

	/// Registers a callback invoked once per distinct state transition.
	pub fn on_state_change<F>(mut self, callback: F) -> Self
	where
		F: 'static + FnMut(&TransactionState) + Send,
	{
		self.on_state_change = Some(Box::new(callback));

		self
	}
}
impl Default for WaitOptions {
	fn default() -> Self {
		Self {
			interval: Self::DEFAULT_INTERVAL,
			timeout: Self::DEFAULT_TIMEOUT,
			initial_state: None,
			on_state_change: None,
		}
	}
}
impl Debug for WaitOptions {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("WaitOptions")
			.field("interval", &self.interval)
			.field("timeout", &self.timeout)
			.field("initial_state", &self.initial_state)
			.field("on_state_change", &self.on_state_change.is_some())
			.finish()
	}
}

impl<T> Client<T>
where
	T: ?Sized + HttpTransport,
{
	/// Polls `id` until it reaches a terminal state or `options.timeout` elapses.
	///
	/// A per-call HTTP timeout counts as a missed poll; every other error is returned. The
	/// budget follows the client's wall [`Clock`](crate::clock::Clock), so system clock jumps
	/// stretch or shorten it.
	pub async fn wait_for_completion(
		&self,
		id: &TxnId,
		options: WaitOptions,
	) -> Result<Transaction> {
		const KIND: OperationKind = OperationKind::Poll;

		let span = OperationSpan::new(KIND, "wait_for_completion");

		obs::record_outcome(KIND, Outcome::Attempt);

		let result = span.instrument(self.poll_until_terminal(id, options)).await;

		match &result {
			Ok(_) => obs::record_outcome(KIND, Outcome::Success),
			Err(_) => obs::record_outcome(KIND, Outcome::Failure),
		}

		result
	}

	async fn poll_until_terminal(&self, id: &TxnId, options: WaitOptions) -> Result<Transaction> {
		let WaitOptions { interval, timeout, initial_state, mut on_state_change } = options;
		let started = self.clock().now();
		let mut previous = initial_state;

		while elapsed_since(self.clock().now(), started) < timeout {
			match self.transactions().get(id).await {
				Ok(txn) => {
					if let Some(prior) = &previous
						&& *prior != txn.state
					{
						tracing::debug!(txn_id = %id, from = %prior, to = %txn.state, "State changed.");

						if let Some(callback) = on_state_change.as_mut() {
							callback(&txn.state);
						}
					}
					if txn.state.is_terminal() {
						return Ok(txn);
					}

					previous = Some(txn.state);
				},
				Err(Error::Timeout { timeout: call_timeout }) => {
					tracing::warn!(
						txn_id = %id,
						timeout_ms = call_timeout.as_millis() as u64,
						"Poll timed out; retrying on schedule."
					);
				},
				Err(e) => return Err(e),
			}

			self.sleeper().sleep(interval).await;
		}

		Err(Error::WaitTimeout { id: id.clone(), timeout })
	}
}

fn elapsed_since(now: OffsetDateTime, started: OffsetDateTime) -> Duration {
	Duration::try_from(now - started).unwrap_or_default()
}
