//! Transport core: authenticated requests with timeouts, bounded retries, and re-authentication.
//!
//! [`Client`] owns the shared pieces every call needs (transport, token manager, retry
//! policy, clock, sleeper) behind `Arc`s, so clones are cheap and may be used concurrently
//! from many tasks. Each call carries its own retry state; the session is the only state
//! shared between calls.
//!
//! Per call the client ensures a valid session, dispatches under the configured timeout, and
//! classifies failures: 401 clears the access token and retries, 429 and 5xx retry after the
//! policy's backoff, any other status fails at once. Local timeouts and network failures are
//! never retried here.

// self
use crate::{
	_prelude::*,
	auth::{AccountId, TokenManager},
	clock::{Clock, Sleeper, SystemClock, TokioSleeper},
	config::ClientConfig,
	error::{ApiError, ConfigError},
	http::{self, HttpRequest, HttpTransport, Method},
	obs::{self, OperationKind, OperationSpan, Outcome, TransportMetrics},
	retry::RetryPolicy,
	transaction::Transactions,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestPayrailClient = Client<ReqwestTransport>;

/// Immutable description of one logical API call.
#[derive(Clone, Debug, PartialEq)]
pub struct RequestDescriptor {
	/// HTTP verb.
	pub method: Method,
	/// Path relative to the base URL.
	pub path: String,
	/// JSON body, if any.
	pub body: Option<Value>,
}
impl RequestDescriptor {
	/// Creates a descriptor without a body.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self { method, path: path.into(), body: None }
	}

	/// Creates a descriptor with a serialized JSON body.
	pub fn with_body<B>(method: Method, path: impl Into<String>, body: &B) -> Result<Self>
	where
		B: ?Sized + Serialize,
	{
		let body = serde_json::to_value(body).map_err(ConfigError::RequestBody)?;

		Ok(Self { method, path: path.into(), body: Some(body) })
	}
}

/// Typed, authenticated client for the Payrail API.
pub struct Client<T>
where
	T: ?Sized + HttpTransport,
{
	transport: Arc<T>,
	tokens: Arc<TokenManager<T>>,
	config: Arc<ClientConfig>,
	retry: RetryPolicy,
	clock: Arc<dyn Clock>,
	sleeper: Arc<dyn Sleeper>,
	metrics: Arc<TransportMetrics>,
}
impl<T> Client<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a client on top of a caller-provided transport.
	///
	/// No network activity happens until the first call that needs a session.
	pub fn with_transport(config: ClientConfig, transport: impl Into<Arc<T>>) -> Result<Self> {
		Self::with_parts(config, transport, Arc::new(SystemClock), Arc::new(TokioSleeper))
	}

	/// Creates a client with explicit time sources.
	pub fn with_parts(
		config: ClientConfig,
		transport: impl Into<Arc<T>>,
		clock: Arc<dyn Clock>,
		sleeper: Arc<dyn Sleeper>,
	) -> Result<Self> {
		let transport = transport.into();
		let config = Arc::new(config);
		let metrics = Arc::new(TransportMetrics::default());
		let tokens = Arc::new(TokenManager::new(
			transport.clone(),
			config.clone(),
			clock.clone(),
			metrics.clone(),
		)?);

		Ok(Self { transport, tokens, retry: config.retry_policy(), config, clock, sleeper, metrics })
	}

	/// Replaces the retry policy derived from `max_retries`.
	pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
		self.retry = policy;

		self
	}

	/// Active configuration.
	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	/// Active retry policy.
	pub fn retry_policy(&self) -> RetryPolicy {
		self.retry
	}

	/// Shared transport counters.
	pub fn metrics(&self) -> &TransportMetrics {
		&self.metrics
	}

	/// Token manager owning the session.
	pub fn tokens(&self) -> &TokenManager<T> {
		&self.tokens
	}

	pub(crate) fn transport(&self) -> &Arc<T> {
		&self.transport
	}

	pub(crate) fn clock(&self) -> &dyn Clock {
		self.clock.as_ref()
	}

	pub(crate) fn sleeper(&self) -> &dyn Sleeper {
		self.sleeper.as_ref()
	}

	/// Transaction endpoints.
	pub fn transactions(&self) -> Transactions<'_, T> {
		Transactions::new(self)
	}

	/// Ensures a valid session and returns the account it belongs to.
	pub async fn ensure_auth_and_get_account_id(&self) -> Result<AccountId> {
		Ok(self.tokens.ensure_auth().await?.account_id.clone())
	}

	/// Authorization header for callers building raw requests.
	pub async fn auth_headers(&self) -> Result<Vec<(&'static str, String)>> {
		let session = self.tokens.ensure_auth().await?;

		Ok(vec![("Authorization", format!("Bearer {}", session.access_token.expose()))])
	}

	/// `GET path`.
	pub async fn get(&self, path: &str) -> Result<Value> {
		self.request(RequestDescriptor::new(Method::Get, path)).await
	}

	/// `POST path` with a JSON body.
	pub async fn post<B>(&self, path: &str, body: &B) -> Result<Value>
	where
		B: ?Sized + Serialize,
	{
		self.request(RequestDescriptor::with_body(Method::Post, path, body)?).await
	}

	/// `PUT path` with a JSON body.
	pub async fn put<B>(&self, path: &str, body: &B) -> Result<Value>
	where
		B: ?Sized + Serialize,
	{
		self.request(RequestDescriptor::with_body(Method::Put, path, body)?).await
	}

	/// `DELETE path`.
	pub async fn delete(&self, path: &str) -> Result<Value> {
		self.request(RequestDescriptor::new(Method::Delete, path)).await
	}

	/// `GET path`, unwrapping any envelope and decoding into `R`.
	pub async fn get_as<R>(&self, path: &str) -> Result<R>
	where
		R: DeserializeOwned,
	{
		decode(self.get(path).await?)
	}

	/// `POST path`, unwrapping any envelope and decoding into `R`.
	pub async fn post_as<B, R>(&self, path: &str, body: &B) -> Result<R>
	where
		B: ?Sized + Serialize,
		R: DeserializeOwned,
	{
		decode(self.post(path, body).await?)
	}

	/// `PUT path`, unwrapping any envelope and decoding into `R`.
	pub async fn put_as<B, R>(&self, path: &str, body: &B) -> Result<R>
	where
		B: ?Sized + Serialize,
		R: DeserializeOwned,
	{
		decode(self.put(path, body).await?)
	}

	/// Executes one logical call through the retry loop and returns the parsed JSON body.
	///
	/// A successful response with an empty body yields [`Value::Null`].
	pub async fn request(&self, descriptor: RequestDescriptor) -> Result<Value> {
		const KIND: OperationKind = OperationKind::Request;

		let span = OperationSpan::new(KIND, "request");

		obs::record_outcome(KIND, Outcome::Attempt);
		self.metrics.record_request();

		let result = span.instrument(self.execute(&descriptor)).await;

		match &result {
			Ok(_) => obs::record_outcome(KIND, Outcome::Success),
			Err(e) => {
				obs::record_outcome(KIND, Outcome::Failure);
				self.metrics.record_failure();
				tracing::debug!(
					method = descriptor.method.as_str(),
					path = %descriptor.path,
					error = %e,
					"Request failed."
				);
			},
		}

		result
	}

	async fn execute(&self, descriptor: &RequestDescriptor) -> Result<Value> {
		let url = self.config.endpoint(&descriptor.path)?;
		let body = descriptor
			.body
			.as_ref()
			.map(serde_json::to_vec)
			.transpose()
			.map_err(ConfigError::RequestBody)?;
		let mut attempt = 0;

		loop {
			if attempt > 0 {
				let delay = self.retry.delay_for(attempt);

				tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "Backing off.");
				self.sleeper.sleep(delay).await;
				self.metrics.record_retry();
			}

			// Re-checked every attempt so a token that went stale mid-loop is refreshed.
			let session = self.tokens.ensure_auth().await?;
			let mut request = HttpRequest::new(descriptor.method, url.clone())
				.header("Authorization", format!("Bearer {}", session.access_token.expose()))
				.header("Content-Type", "application/json")
				.header("Accept", "application/json");

			if let Some(body) = &body {
				request = request.body(body.clone());
			}

			obs::debug_request(self.config.debug, descriptor.method.as_str(), url.path(), attempt);

			let response =
				tokio::time::timeout(self.config.timeout, self.transport.execute(request))
					.await
					.map_err(|_| Error::Timeout { timeout: self.config.timeout })??;

			if response.is_success() {
				return parse_body(&response.body);
			}

			let err = ApiError::from_response(response.status, &response.body);
			let retryable = if err.status == 401 {
				self.tokens.invalidate();

				true
			} else {
				err.is_retryable()
			};

			if !retryable || !self.retry.allows_retry_after(attempt) {
				return Err(err.into());
			}

			tracing::warn!(status = err.status, attempt, "Retrying API request.");

			attempt += 1;
		}
	}
}
#[cfg(feature = "reqwest")]
impl Client<ReqwestTransport> {
	/// Creates a client backed by a fresh reqwest connection pool.
	pub fn new(config: ClientConfig) -> Result<Self> {
		let client = ReqwestClient::builder().build().map_err(ConfigError::from)?;

		Self::with_transport(config, ReqwestTransport::with_client(client))
	}
}
impl<T> Clone for Client<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			transport: self.transport.clone(),
			tokens: self.tokens.clone(),
			config: self.config.clone(),
			retry: self.retry,
			clock: self.clock.clone(),
			sleeper: self.sleeper.clone(),
			metrics: self.metrics.clone(),
		}
	}
}
impl<T> Debug for Client<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Client")
			.field("config", &self.config)
			.field("retry", &self.retry)
			.field("authenticated", &self.tokens.is_valid())
			.finish()
	}
}

/// Unwraps any envelope and decodes `value` into `R`, reporting the failing JSON path.
pub fn decode<R>(value: Value) -> Result<R>
where
	R: DeserializeOwned,
{
	Ok(serde_path_to_error::deserialize(http::unwrap_envelope(value))?)
}

fn parse_body(raw: &[u8]) -> Result<Value> {
	if raw.iter().all(u8::is_ascii_whitespace) {
		return Ok(Value::Null);
	}

	let mut de = serde_json::Deserializer::from_slice(raw);

	Ok(serde_path_to_error::deserialize(&mut de)?)
}
