//! Injectable time sources so token expiry, backoff, and polling stay testable.
//!
//! Production clients use [`SystemClock`] and [`TokioSleeper`]. Tests substitute a manual
//! clock whose sleeper advances virtual time, which lets retry and polling schedules run
//! without real delays.
//!
//! [`Clock`] is wall-clock time. Token expiry and the polling budget of
//! `Client::wait_for_completion` are both measured with it, so a backwards system clock jump
//! lengthens a wait (elapsed time never goes negative) and a forward jump shortens it.
//! Per-call HTTP timeouts and event-stream deadlines use the monotonic tokio timer instead.

// self
use crate::_prelude::*;

/// Boxed future returned by [`Sleeper::sleep`].
pub type SleepFuture<'a> = Pin<Box<dyn Future<Output = ()> + 'a + Send>>;

/// Wall-clock source for session expiry and polling budgets.
pub trait Clock
where
	Self: 'static + Send + Sync,
{
	/// Current UTC instant.
	fn now(&self) -> OffsetDateTime;
}

/// Delay source used for backoff and polling intervals.
pub trait Sleeper
where
	Self: 'static + Send + Sync,
{
	/// Suspends the caller for `duration`.
	fn sleep(&self, duration: Duration) -> SleepFuture<'_>;
}

/// [`Clock`] backed by the operating system.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;
impl Clock for SystemClock {
	fn now(&self) -> OffsetDateTime {
		OffsetDateTime::now_utc()
	}
}

/// [`Sleeper`] backed by `tokio::time::sleep`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioSleeper;
impl Sleeper for TokioSleeper {
	fn sleep(&self, duration: Duration) -> SleepFuture<'_> {
		Box::pin(tokio::time::sleep(duration))
	}
}
