// crates.io
use time::format_description::well_known::Rfc3339;
use tracing::{Instrument, Span, instrument::Instrumented};
// self
use crate::{_prelude::*, obs::OperationKind};

/// Span wrapper used by client operations.
#[derive(Clone, Debug)]
pub struct OperationSpan {
	span: Span,
}
impl OperationSpan {
	/// Creates a new span tagged with the provided operation kind + stage.
	pub fn new(kind: OperationKind, stage: &'static str) -> Self {
		let span = tracing::info_span!("payrail.operation", operation = kind.as_str(), stage);

		Self { span }
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> Instrumented<Fut>
	where
		Fut: Future,
	{
		fut.instrument(self.span.clone())
	}
}

/// Emits a debug-mode line for an outgoing request.
///
/// Only the verb, path, and attempt number are recorded.
pub fn debug_request(enabled: bool, method: &str, path: &str, attempt: u32) {
	if enabled {
		tracing::info!(
			target: "payrail::debug",
			timestamp = %timestamp(),
			method,
			path,
			attempt,
			"Dispatching request."
		);
	}
}

/// Emits a debug-mode line for a completed authentication.
pub fn debug_authenticated(enabled: bool, account_id: &str, expires_at: OffsetDateTime) {
	if enabled {
		tracing::info!(
			target: "payrail::debug",
			timestamp = %timestamp(),
			account_id,
			expires_at = %expires_at.format(&Rfc3339).unwrap_or_default(),
			"Authenticated."
		);
	}
}

fn timestamp() -> String {
	let now = OffsetDateTime::now_utc();

	now.format(&Rfc3339).unwrap_or_else(|_| now.unix_timestamp().to_string())
}
