//! Client-level error types shared across the signer, token manager, transport, and workflows.

// self
use crate::{_prelude::*, auth::TxnId};

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Caller-supplied argument violates a precondition.
	#[error(transparent)]
	Validation(#[from] ValidationError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Non-2xx response from the API.
	#[error(transparent)]
	Api(#[from] ApiError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Credentials are missing or the token endpoint rejected the signed challenge.
	#[error("Authentication failed: {message}.")]
	Auth {
		/// Server- or client-supplied reason string.
		message: String,
		/// HTTP status code, when the failure came from the token endpoint.
		status: Option<u16>,
	},
	/// A single HTTP call did not complete within the configured timeout.
	#[error("Request timed out after {} ms.", .timeout.as_millis())]
	Timeout {
		/// Configured per-call timeout.
		timeout: Duration,
	},
	/// Polling gave up before the transaction reached a terminal state.
	#[error("Transaction {id} did not reach a terminal state within {} ms.", .timeout.as_millis())]
	WaitTimeout {
		/// Transaction being polled.
		id: TxnId,
		/// Overall polling budget.
		timeout: Duration,
	},
	/// Response body could not be decoded into the expected shape.
	#[error("Response body could not be decoded at `{path}`.")]
	Decode {
		/// JSON path where decoding failed.
		path: String,
		/// Structured decoding failure.
		#[source]
		source: serde_json::Error,
	},
	/// Operation is disabled for the configured API variant.
	#[error("{operation} is not supported: {reason}.")]
	Unsupported {
		/// Operation label.
		operation: &'static str,
		/// Why the operation is unavailable.
		reason: &'static str,
	},
}
impl Error {
	/// Builds an [`Error::Auth`] that did not originate from an HTTP response.
	pub fn auth(message: impl Into<String>) -> Self {
		Self::Auth { message: message.into(), status: None }
	}

	/// Returns `true` for both per-call and polling timeouts.
	pub fn is_timeout(&self) -> bool {
		matches!(self, Self::Timeout { .. } | Self::WaitTimeout { .. })
	}

	/// Returns the wrapped [`ApiError`], if any.
	pub fn as_api(&self) -> Option<&ApiError> {
		match self {
			Self::Api(e) => Some(e),
			_ => None,
		}
	}
}
impl From<crate::auth::IdentifierError> for Error {
	fn from(e: crate::auth::IdentifierError) -> Self {
		Self::Validation(e.into())
	}
}
impl From<serde_path_to_error::Error<serde_json::Error>> for Error {
	fn from(e: serde_path_to_error::Error<serde_json::Error>) -> Self {
		Self::Decode { path: e.path().to_string(), source: e.into_inner() }
	}
}

/// Argument validation failures; never retried.
#[derive(Debug, ThisError)]
pub enum ValidationError {
	/// A required field was empty or absent.
	#[error("The `{field}` field is required.")]
	MissingField {
		/// Field label.
		field: &'static str,
	},
	/// Identifier failed structural validation.
	#[error(transparent)]
	Identifier(#[from] crate::auth::IdentifierError),
	/// Identifier is well-formed but not in canonical UUID form.
	#[error("`{value}` is not a canonical transaction identifier.")]
	NonCanonicalId {
		/// Offending identifier.
		value: String,
	},
	/// Value fell outside the accepted range.
	#[error("The `{field}` value {value} is outside {min}..={max}.")]
	OutOfRange {
		/// Field label.
		field: &'static str,
		/// Supplied value.
		value: u64,
		/// Inclusive lower bound.
		min: u64,
		/// Inclusive upper bound.
		max: u64,
	},
}

/// Configuration failures raised while building a client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Base URL cannot be parsed.
	#[error("Base URL `{value}` is invalid.")]
	InvalidBaseUrl {
		/// Supplied base URL.
		value: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Base URL cannot carry a path (e.g. `data:` URLs).
	#[error("Base URL `{value}` cannot be used as a request base.")]
	UnsupportedBaseUrl {
		/// Supplied base URL.
		value: String,
	},
	/// Request body could not be serialized.
	#[error("Request body could not be serialized.")]
	RequestBody(#[source] serde_json::Error),
	/// Header value contains characters HTTP does not allow.
	#[error("Header `{name}` has an invalid value.")]
	InvalidHeader {
		/// Header name.
		name: &'static str,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Non-2xx API response carrying the status and best-effort parsed error body.
#[derive(Clone, Debug, ThisError)]
#[error("API request failed with status {status}: {message}.")]
pub struct ApiError {
	/// HTTP status code.
	pub status: u16,
	/// Service-specific error code, when supplied.
	pub code: Option<String>,
	/// Human-readable message (`error`/`message` body field or the canonical reason).
	pub message: String,
	/// Parsed error body; `{}` when the body was absent or not JSON.
	pub body: Value,
}
impl ApiError {
	/// Builds an error from a status code and raw response bytes.
	///
	/// Bodies that are not JSON objects degrade to an empty object.
	pub fn from_response(status: u16, raw: &[u8]) -> Self {
		let body = match serde_json::from_slice::<Value>(raw) {
			Ok(value @ Value::Object(_)) => value,
			_ => Value::Object(Default::default()),
		};
		let code = body.get("code").and_then(|code| match code {
			Value::String(s) => Some(s.clone()),
			Value::Number(n) => Some(n.to_string()),
			_ => None,
		});
		let message = error_message(&body).unwrap_or_else(|| format!("HTTP {status}"));

		Self { status, code, message, body }
	}

	/// Status 429 or any 5xx.
	pub fn is_retryable(&self) -> bool {
		self.status == 429 || self.status >= 500
	}

	/// Status 401 or 403.
	pub fn is_auth_error(&self) -> bool {
		matches!(self.status, 401 | 403)
	}

	/// Status 429.
	pub fn is_rate_limited(&self) -> bool {
		self.status == 429
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the API.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Extracts the `error` or `message` string from an error body.
pub(crate) fn error_message(body: &Value) -> Option<String> {
	["error", "message"]
		.iter()
		.filter_map(|key| body.get(*key).and_then(Value::as_str))
		.find(|s| !s.trim().is_empty())
		.map(str::to_owned)
}
