//! Server-sent transaction events over one long-lived connection.

// crates.io
use futures::{StreamExt, stream::BoxStream};
use tokio::time::Instant;
// self
use crate::{
	_prelude::*,
	auth::TxnId,
	client::Client,
	error::ApiError,
	http::{HttpRequest, HttpTransport, Method},
	obs::{self, OperationKind, OperationSpan, Outcome},
	transaction::TransactionEvent,
};

/// Lazy sequence of transaction events; dropping it closes the connection.
pub type EventStream = BoxStream<'static, Result<TransactionEvent>>;

/// Shortest accepted stream lifetime.
pub const MIN_STREAM_TIMEOUT: Duration = Duration::from_millis(5_000);
/// Longest accepted stream lifetime.
pub const MAX_STREAM_TIMEOUT: Duration = Duration::from_millis(300_000);

const DONE_SENTINEL: &str = "[DONE]";

/// Clamps a requested stream lifetime into the accepted window.
pub fn clamp_stream_timeout(timeout: Duration) -> Duration {
	timeout.clamp(MIN_STREAM_TIMEOUT, MAX_STREAM_TIMEOUT)
}

impl<T> Client<T>
where
	T: ?Sized + HttpTransport,
{
	/// Opens a lazy event stream for `id`.
	///
	/// The identifier is validated here; authentication and the connection itself wait until
	/// the stream is first polled. The stream ends when the server closes the connection, a
	/// `[DONE]` frame arrives, or the clamped `timeout` elapses. Malformed frames are logged
	/// and skipped.
	pub fn transaction_events(&self, id: &TxnId, timeout: Duration) -> Result<EventStream> {
		id.ensure_canonical()?;

		let client = self.clone();
		let id = id.clone();
		let timeout = clamp_stream_timeout(timeout);
		let span = OperationSpan::new(OperationKind::Stream, "transaction_events");
		let events = async_stream::stream! {
			const KIND: OperationKind = OperationKind::Stream;

			let deadline = Instant::now() + timeout;

			obs::record_outcome(KIND, Outcome::Attempt);

			let request = match span.instrument(client.event_request(&id, timeout)).await {
				Ok(request) => request,
				Err(e) => {
					obs::record_outcome(KIND, Outcome::Failure);

					yield Err(e);

					return;
				},
			};
			let opening = tokio::time::timeout_at(deadline, client.transport().open_stream(request));
			let response = match span.instrument(opening).await {
				Ok(Ok(response)) => response,
				Ok(Err(e)) => {
					obs::record_outcome(KIND, Outcome::Failure);

					yield Err(e.into());

					return;
				},
				Err(_) => {
					tracing::debug!(txn_id = %id, "Event stream timed out before connecting.");
					obs::record_outcome(KIND, Outcome::Success);

					return;
				},
			};
			let mut body = response.body;

			if !(200..300).contains(&response.status) {
				let mut raw = Vec::new();

				while let Ok(Some(Ok(chunk))) = tokio::time::timeout_at(deadline, body.next()).await {
					raw.extend_from_slice(&chunk);
				}

				obs::record_outcome(KIND, Outcome::Failure);

				yield Err(ApiError::from_response(response.status, &raw).into());

				return;
			}

			let mut decoder = FrameDecoder::default();

			loop {
				let lines = match tokio::time::timeout_at(deadline, body.next()).await {
					Ok(Some(Ok(chunk))) => decoder.push(&chunk),
					Ok(Some(Err(e))) => {
						obs::record_outcome(KIND, Outcome::Failure);

						yield Err(e.into());

						return;
					},
					Ok(None) => decoder.finish(),
					Err(_) => {
						tracing::debug!(txn_id = %id, "Event stream reached its timeout.");

						break;
					},
				};

				for line in lines {
					match parse_frame(&line) {
						Frame::Event(event) => yield Ok(*event),
						Frame::Done => {
							obs::record_outcome(KIND, Outcome::Success);

							return;
						},
						Frame::Skip => {},
					}
				}

				if decoder.is_finished() {
					break;
				}
			}

			obs::record_outcome(KIND, Outcome::Success);
		};

		Ok(events.boxed())
	}

	async fn event_request(&self, id: &TxnId, timeout: Duration) -> Result<HttpRequest> {
		let account = self.ensure_auth_and_get_account_id().await?;
		let path = format!(
			"accounts/{account}/transactions/{id}/events?timeoutMs={}",
			timeout.as_millis()
		);
		let mut request = HttpRequest::new(Method::Get, self.config().endpoint(&path)?)
			.header("Accept", "text/event-stream")
			.header("Cache-Control", "no-cache");

		for (name, value) in self.auth_headers().await? {
			request = request.header(name, value);
		}

		obs::debug_request(self.config().debug, Method::Get.as_str(), &path, 0);

		Ok(request)
	}
}

/// Longest line the decoder buffers; longer lines are dropped.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// Reassembles newline-delimited frames from arbitrarily split chunks.
///
/// A line that grows past [`MAX_LINE_BYTES`] is discarded up to its terminating newline.
#[derive(Debug, Default)]
pub struct FrameDecoder {
	buffer: Vec<u8>,
	discarding: bool,
	finished: bool,
}
impl FrameDecoder {
	/// Appends `chunk` and drains every complete, non-blank line.
	pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
		self.buffer.extend_from_slice(chunk);

		let mut lines = Vec::new();

		while let Some(end) = self.buffer.iter().position(|b| *b == b'\n') {
			let raw = self.buffer.drain(..=end).collect::<Vec<_>>();

			if std::mem::take(&mut self.discarding) {
				continue;
			}
			if raw.len() > MAX_LINE_BYTES {
				tracing::warn!(line_len = raw.len(), "Dropping oversized event line.");

				continue;
			}

			push_line(&mut lines, &raw);
		}

		if self.buffer.len() > MAX_LINE_BYTES {
			if !self.discarding {
				tracing::warn!(buffered = self.buffer.len(), "Dropping oversized event line.");
			}

			self.buffer.clear();
			self.discarding = true;
		}

		lines
	}

	/// Flushes a trailing line left without a newline and marks the decoder finished.
	pub fn finish(&mut self) -> Vec<String> {
		let raw = std::mem::take(&mut self.buffer);
		let mut lines = Vec::new();

		if !std::mem::take(&mut self.discarding) {
			push_line(&mut lines, &raw);
		}

		self.finished = true;

		lines
	}

	/// Returns `true` once [`finish`](Self::finish) ran.
	pub fn is_finished(&self) -> bool {
		self.finished
	}
}

fn push_line(lines: &mut Vec<String>, raw: &[u8]) {
	let line = String::from_utf8_lossy(raw);
	let line = line.trim_end_matches(['\n', '\r']);

	if !line.trim().is_empty() {
		lines.push(line.to_owned());
	}
}

/// Interpretation of one line of the event stream.
#[derive(Debug, PartialEq)]
pub enum Frame {
	/// A decoded event.
	Event(Box<TransactionEvent>),
	/// End-of-stream sentinel.
	Done,
	/// Comment, non-data field, or malformed payload.
	Skip,
}

/// Parses one line; only `data:` lines carry events.
pub fn parse_frame(line: &str) -> Frame {
	let Some(payload) = line.strip_prefix("data:") else {
		return Frame::Skip;
	};
	let payload = payload.trim();

	if payload == DONE_SENTINEL {
		return Frame::Done;
	}

	match serde_json::from_str::<Value>(payload)
		.map(crate::http::unwrap_envelope)
		.and_then(serde_json::from_value::<TransactionEvent>)
	{
		Ok(event) => Frame::Event(Box::new(event)),
		Err(e) => {
			tracing::warn!(error = %e, frame_len = payload.len(), "Skipping malformed event frame.");

			Frame::Skip
		},
	}
}
