//! Authentication lifecycle: signed challenge, expiry tracking, and refresh-before-expiry.
//!
//! The manager holds a single session cell. Readers clone the current `Arc<Session>` and
//! release the lock immediately; writers swap the whole record. The lock is never held across
//! an `.await`, so concurrent callers that observe a stale session may each authenticate. That
//! race is accepted: every refresh yields a usable session and the last write wins.

// self
use crate::{
	_prelude::*,
	auth::{AccountId, Secret, Session, Signer},
	clock::Clock,
	config::ClientConfig,
	http::{HttpRequest, HttpTransport, Method},
	obs::{self, OperationKind, OperationSpan, Outcome, TransportMetrics},
};

/// Path of the token endpoint, relative to the base URL.
pub const TOKEN_PATH: &str = "auth/token";

/// Owns the session for one client and every clone of it.
pub struct TokenManager<T>
where
	T: ?Sized + HttpTransport,
{
	transport: Arc<T>,
	signer: Signer,
	config: Arc<ClientConfig>,
	clock: Arc<dyn Clock>,
	metrics: Arc<TransportMetrics>,
	session: RwLock<Option<Arc<Session>>>,
}
impl<T> TokenManager<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates an unauthenticated manager; no network activity happens here.
	pub fn new(
		transport: Arc<T>,
		config: Arc<ClientConfig>,
		clock: Arc<dyn Clock>,
		metrics: Arc<TransportMetrics>,
	) -> Result<Self> {
		let signer = Signer::new(config.api_key.clone(), &config.api_secret)?;

		Ok(Self { transport, signer, config, clock, metrics, session: RwLock::new(None) })
	}

	/// Returns the current session record, if one was ever issued.
	pub fn session(&self) -> Option<Arc<Session>> {
		self.session.read().clone()
	}

	/// Returns `true` when a session exists and is outside the refresh buffer.
	pub fn is_valid(&self) -> bool {
		self.session()
			.is_some_and(|s| s.is_valid_at(self.clock.now(), self.config.refresh_buffer))
	}

	/// Authenticates unless the current session is still valid.
	pub async fn ensure_auth(&self) -> Result<Arc<Session>> {
		if let Some(current) = self.session()
			&& current.is_valid_at(self.clock.now(), self.config.refresh_buffer)
		{
			return Ok(current);
		}

		self.authenticate().await
	}

	/// Exchanges a signed challenge for a fresh session and stores it.
	pub async fn authenticate(&self) -> Result<Arc<Session>> {
		const KIND: OperationKind = OperationKind::Authenticate;

		let span = OperationSpan::new(KIND, "authenticate");

		obs::record_outcome(KIND, Outcome::Attempt);

		let result = span.instrument(self.exchange()).await;

		match &result {
			Ok(session) => {
				obs::record_outcome(KIND, Outcome::Success);
				self.metrics.record_reauthentication();
				obs::debug_authenticated(self.config.debug, &session.account_id, session.expires_at);
			},
			Err(e) => {
				obs::record_outcome(KIND, Outcome::Failure);
				tracing::warn!(error = %e, "Authentication failed.");
			},
		}

		result
	}

	/// Clears the access token so the next [`ensure_auth`](Self::ensure_auth) re-authenticates.
	pub fn invalidate(&self) {
		let mut slot = self.session.write();

		if let Some(current) = slot.as_ref() {
			*slot = Some(Arc::new(current.invalidated()));
		}
	}

	/// Account bound to the credentials; fails if the client never authenticated.
	pub fn account_id(&self) -> Result<AccountId> {
		self.session()
			.map(|s| s.account_id.clone())
			.ok_or_else(|| Error::auth("client has not authenticated yet"))
	}

	/// Current bearer token; fails if the session is missing or invalidated.
	pub fn access_token(&self) -> Result<Secret> {
		self.session()
			.map(|s| s.access_token.clone())
			.filter(|token| !token.is_empty())
			.ok_or_else(|| Error::auth("no access token is available"))
	}

	async fn exchange(&self) -> Result<Arc<Session>> {
		let timestamp = self.clock.now().unix_timestamp_nanos() / 1_000_000;
		let payload = challenge_payload(self.signer.api_key(), timestamp);
		let signature = self.signer.sign(payload.as_bytes());
		let body = serde_json::to_vec(&serde_json::json!({
			"apiKey": self.signer.api_key(),
			"timestamp": timestamp as i64,
			"signature": signature,
		}))
		.map_err(crate::error::ConfigError::RequestBody)?;
		let request = HttpRequest::new(Method::Post, self.config.endpoint(TOKEN_PATH)?)
			.header("Content-Type", "application/json")
			.header("Accept", "application/json")
			.body(body);

		obs::debug_request(self.config.debug, Method::Post.as_str(), TOKEN_PATH, 0);

		let response = tokio::time::timeout(self.config.timeout, self.transport.execute(request))
			.await
			.map_err(|_| Error::Timeout { timeout: self.config.timeout })??;

		if !response.is_success() {
			let body = serde_json::from_slice::<Value>(&response.body).unwrap_or(Value::Null);
			let message = crate::error::error_message(&body)
				.unwrap_or_else(|| "token endpoint rejected the signed challenge".into());

			return Err(Error::Auth { message, status: Some(response.status) });
		}

		let session = Arc::new(Session::from_response_body(&response.body)?);

		*self.session.write() = Some(session.clone());

		Ok(session)
	}
}
impl<T> Debug for TokenManager<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenManager")
			.field("signer", &self.signer)
			.field("session", &self.session())
			.finish()
	}
}

/// Builds the compact JSON challenge signed during authentication.
pub fn challenge_payload(api_key: &str, timestamp_ms: i128) -> String {
	serde_json::json!({ "apiKey": api_key, "timestamp": timestamp_ms as i64 }).to_string()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn challenge_payload_is_compact_and_ordered() {
		assert_eq!(
			challenge_payload("key-1", 1_735_689_600_000),
			"{\"apiKey\":\"key-1\",\"timestamp\":1735689600000}"
		);
	}
}
