//! Observability helpers for client operations.
//!
//! Every operation runs inside a `payrail.operation` span carrying `operation` and `stage`
//! fields. Enable the `metrics` feature to increment the `payrail_operation_total` counter for
//! every attempt/success/failure, labeled by `operation` + `outcome`. Debug mode lines go to
//! the `payrail::debug` target and never carry credentials or tokens.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operation kinds observed by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
	/// Token endpoint exchange.
	Authenticate,
	/// Authenticated API request through the retry loop.
	Request,
	/// Wait-for-terminal-state polling.
	Poll,
	/// Event stream consumption.
	Stream,
}
impl OperationKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationKind::Authenticate => "authenticate",
			OperationKind::Request => "request",
			OperationKind::Poll => "poll",
			OperationKind::Stream => "stream",
		}
	}
}
impl Display for OperationKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
	/// Entry to a client operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl Outcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Outcome::Attempt => "attempt",
			Outcome::Success => "success",
			Outcome::Failure => "failure",
		}
	}
}
impl Display for Outcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
