//! Explicit retry policy consumed by the transport core.

// self
use crate::_prelude::*;

/// Bounded retry budget plus the delay schedule between attempts.
///
/// `max_retries` counts additional attempts, so a policy with `max_retries = 2` dispatches a
/// request at most three times. The delay function receives the 1-based retry number.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
	/// Additional attempts after the first dispatch.
	pub max_retries: u32,
	/// Delay before retry `n` (1-based).
	pub delay_fn: fn(u32) -> Duration,
}
impl RetryPolicy {
	/// Default retry budget.
	pub const DEFAULT_MAX_RETRIES: u32 = 2;

	/// Exponential schedule: 1 s, 2 s, 4 s, … with no jitter.
	pub fn exponential(max_retries: u32) -> Self {
		Self { max_retries, delay_fn: exponential_delay }
	}

	/// Policy that never retries.
	pub fn none() -> Self {
		Self::exponential(0)
	}

	/// Replaces the delay schedule.
	pub fn with_delay_fn(mut self, delay_fn: fn(u32) -> Duration) -> Self {
		self.delay_fn = delay_fn;

		self
	}

	/// Total dispatches allowed.
	pub fn max_attempts(&self) -> u32 {
		self.max_retries.saturating_add(1)
	}

	/// Delay before `attempt` (0-based); the first attempt never waits.
	pub fn delay_for(&self, attempt: u32) -> Duration {
		if attempt == 0 { Duration::ZERO } else { (self.delay_fn)(attempt) }
	}

	/// Whether another attempt may follow `attempt` (0-based).
	pub fn allows_retry_after(&self, attempt: u32) -> bool {
		attempt < self.max_retries
	}
}
impl Default for RetryPolicy {
	fn default() -> Self {
		Self::exponential(Self::DEFAULT_MAX_RETRIES)
	}
}

fn exponential_delay(retry: u32) -> Duration {
	let exponent = retry.saturating_sub(1).min(16);

	Duration::from_secs(1_u64 << exponent)
}
