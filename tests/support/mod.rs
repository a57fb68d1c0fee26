//! Scripted transport and virtual time shared by the integration suites.

#![allow(dead_code)]

// std
use std::{
	collections::VecDeque,
	sync::{
		Arc,
		atomic::{AtomicBool, AtomicUsize, Ordering},
	},
	time::Duration,
};
// crates.io
use futures::{StreamExt, stream};
use parking_lot::Mutex;
use serde_json::{Value, json};
use time::{OffsetDateTime, macros};
// self
use payrail::{
	auth::{TOKEN_PATH, TxnId},
	client::Client,
	clock::{Clock, SleepFuture, Sleeper},
	config::{ClientConfig, ClientConfigBuilder},
	error::TransportError,
	http::{HttpRequest, HttpResponse, HttpTransport, StreamResponse, TransportFuture},
};

pub const API_KEY: &str = "key-1";
pub const API_SECRET: &str = "secret-1";
pub const BASE_URL: &str = "https://api.test/v1";
pub const ACCOUNT: &str = "acct-1";
pub const TXN: &str = "3f1c2a8e-6d7b-4c1e-9a0f-5b2d8e7c6a41";

/// Virtual clock start; default tokens expire one hour later.
pub const EPOCH: OffsetDateTime = macros::datetime!(2025-01-01 00:00 UTC);

pub fn txn_id() -> TxnId {
	TxnId::new(TXN).expect("Transaction fixture should be valid.")
}

pub fn token_body(token: &str, expires_at: OffsetDateTime) -> HttpResponse {
	let expired_at = (expires_at.unix_timestamp_nanos() / 1_000_000) as i64;

	json_response(
		200,
		json!({ "accountId": ACCOUNT, "accessToken": token, "expiredAt": expired_at }),
	)
}

pub fn json_response(status: u16, body: Value) -> HttpResponse {
	HttpResponse::new(status, body.to_string())
}

pub fn txn_response(state: &str) -> HttpResponse {
	json_response(200, json!({ "txnId": TXN, "state": state, "amount": "0.001" }))
}

#[derive(Clone, Debug)]
pub enum Reply {
	Respond(HttpResponse),
	/// Never completes; exercises per-call timeouts.
	Hang,
}
impl From<HttpResponse> for Reply {
	fn from(value: HttpResponse) -> Self {
		Self::Respond(value)
	}
}

#[derive(Debug)]
pub struct StreamScript {
	pub status: u16,
	pub chunks: Vec<Vec<u8>>,
	/// Keeps the connection open after the last chunk.
	pub hang: bool,
}
impl StreamScript {
	pub fn ok<I, C>(chunks: I) -> Self
	where
		I: IntoIterator<Item = C>,
		C: Into<Vec<u8>>,
	{
		Self { status: 200, chunks: chunks.into_iter().map(Into::into).collect(), hang: false }
	}

	pub fn hanging(mut self) -> Self {
		self.hang = true;

		self
	}
}

/// In-process transport: token calls and API calls are scripted separately.
///
/// Auth replies default to a valid one-hour token. API replies are consumed in order and the
/// last one repeats once the script runs dry.
#[derive(Default)]
pub struct ScriptedTransport {
	auth: Mutex<VecDeque<HttpResponse>>,
	api: Mutex<VecDeque<Reply>>,
	last_api: Mutex<Option<Reply>>,
	streams: Mutex<VecDeque<StreamScript>>,
	requests: Mutex<Vec<HttpRequest>>,
	auth_calls: AtomicUsize,
	api_calls: AtomicUsize,
	released: Arc<AtomicBool>,
}
impl ScriptedTransport {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_auth<I>(self, replies: I) -> Self
	where
		I: IntoIterator<Item = HttpResponse>,
	{
		self.auth.lock().extend(replies);

		self
	}

	pub fn with_api<I, R>(self, replies: I) -> Self
	where
		I: IntoIterator<Item = R>,
		R: Into<Reply>,
	{
		self.api.lock().extend(replies.into_iter().map(Into::into));

		self
	}

	pub fn with_stream(self, script: StreamScript) -> Self {
		self.streams.lock().push_back(script);

		self
	}

	pub fn auth_calls(&self) -> usize {
		self.auth_calls.load(Ordering::SeqCst)
	}

	pub fn api_calls(&self) -> usize {
		self.api_calls.load(Ordering::SeqCst)
	}

	pub fn requests(&self) -> Vec<HttpRequest> {
		self.requests.lock().clone()
	}

	pub fn api_requests(&self) -> Vec<HttpRequest> {
		self.requests().into_iter().filter(|r| !r.url.path().ends_with(TOKEN_PATH)).collect()
	}

	pub fn auth_requests(&self) -> Vec<HttpRequest> {
		self.requests().into_iter().filter(|r| r.url.path().ends_with(TOKEN_PATH)).collect()
	}

	/// Whether the last opened stream body has been dropped.
	pub fn stream_released(&self) -> bool {
		self.released.load(Ordering::SeqCst)
	}

	fn next_api(&self) -> Reply {
		let next = self.api.lock().pop_front();
		let mut last = self.last_api.lock();

		match next {
			Some(reply) => {
				*last = Some(reply.clone());

				reply
			},
			None => last.clone().unwrap_or_else(|| json_response(200, json!({})).into()),
		}
	}
}
impl HttpTransport for ScriptedTransport {
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_, HttpResponse> {
		let is_auth = request.url.path().ends_with(TOKEN_PATH);

		self.requests.lock().push(request);

		let reply = if is_auth {
			self.auth_calls.fetch_add(1, Ordering::SeqCst);

			let token = format!("tok-{}", self.auth_calls());

			Reply::Respond(
				self.auth
					.lock()
					.pop_front()
					.unwrap_or_else(|| token_body(&token, EPOCH + Duration::from_secs(3_600))),
			)
		} else {
			self.api_calls.fetch_add(1, Ordering::SeqCst);
			self.next_api()
		};

		Box::pin(async move {
			match reply {
				Reply::Respond(response) => Ok(response),
				Reply::Hang => std::future::pending().await,
			}
		})
	}

	fn open_stream(&self, request: HttpRequest) -> TransportFuture<'_, StreamResponse> {
		self.requests.lock().push(request);
		self.api_calls.fetch_add(1, Ordering::SeqCst);

		let script = self
			.streams
			.lock()
			.pop_front()
			.unwrap_or_else(|| StreamScript::ok(Vec::<Vec<u8>>::new()));
		let guard = ReleaseGuard(self.released.clone());

		self.released.store(false, Ordering::SeqCst);

		Box::pin(async move {
			let chunks = stream::iter(script.chunks.into_iter().map(Ok::<_, TransportError>));
			let body = if script.hang {
				chunks.chain(stream::pending()).boxed()
			} else {
				chunks.boxed()
			};
			let body = body
				.map(move |chunk| {
					let _ = &guard;

					chunk
				})
				.boxed();

			Ok(StreamResponse { status: script.status, body })
		})
	}
}

struct ReleaseGuard(Arc<AtomicBool>);
impl Drop for ReleaseGuard {
	fn drop(&mut self) {
		self.0.store(true, Ordering::SeqCst);
	}
}

/// Manually advanced wall clock.
#[derive(Debug)]
pub struct ManualClock(Mutex<OffsetDateTime>);
impl ManualClock {
	pub fn new(start: OffsetDateTime) -> Self {
		Self(Mutex::new(start))
	}

	pub fn advance(&self, by: Duration) {
		*self.0.lock() += by;
	}
}
impl Clock for ManualClock {
	fn now(&self) -> OffsetDateTime {
		*self.0.lock()
	}
}

/// Records requested delays and advances the shared clock instead of sleeping.
#[derive(Debug)]
pub struct RecordingSleeper {
	clock: Arc<ManualClock>,
	delays: Mutex<Vec<Duration>>,
}
impl RecordingSleeper {
	pub fn new(clock: Arc<ManualClock>) -> Self {
		Self { clock, delays: Mutex::new(Vec::new()) }
	}

	pub fn delays(&self) -> Vec<Duration> {
		self.delays.lock().clone()
	}
}
impl Sleeper for RecordingSleeper {
	fn sleep(&self, duration: Duration) -> SleepFuture<'_> {
		self.delays.lock().push(duration);
		self.clock.advance(duration);

		Box::pin(async {})
	}
}

pub struct Harness {
	pub client: Client<ScriptedTransport>,
	pub transport: Arc<ScriptedTransport>,
	pub clock: Arc<ManualClock>,
	pub sleeper: Arc<RecordingSleeper>,
}
impl Harness {
	pub fn new(transport: ScriptedTransport) -> Self {
		Self::with_config(transport, |builder| builder)
	}

	pub fn with_config<F>(transport: ScriptedTransport, configure: F) -> Self
	where
		F: FnOnce(ClientConfigBuilder) -> ClientConfigBuilder,
	{
		let config = configure(ClientConfig::builder(API_KEY, API_SECRET).base_url(BASE_URL))
			.build()
			.expect("Test config should build.");
		let transport = Arc::new(transport);
		let clock = Arc::new(ManualClock::new(EPOCH));
		let sleeper = Arc::new(RecordingSleeper::new(clock.clone()));
		let client = Client::<ScriptedTransport>::with_parts(config, transport.clone(), clock.clone(), sleeper.clone())
			.expect("Client should build without network access.");

		Self { client, transport, clock, sleeper }
	}
}
