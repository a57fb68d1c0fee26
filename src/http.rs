//! Transport primitives for API calls.
//!
//! The module exposes [`HttpTransport`] alongside the plain [`HttpRequest`] and
//! [`HttpResponse`] values it exchanges, so downstream crates can plug in custom HTTP stacks
//! (proxies, recorders, test fakes) without touching the retry, authentication, or streaming
//! logic. The default [`ReqwestTransport`] wraps a shared [`ReqwestClient`].
//!
//! Transports only move bytes. Timeouts, status classification, and retries live in the
//! client so every transport gets identical semantics.

// crates.io
use futures::stream::BoxStream;
#[cfg(feature = "reqwest")] use futures::{StreamExt, TryStreamExt};
// self
use crate::{_prelude::*, error::TransportError};

/// Boxed future returned by [`HttpTransport::execute`].
pub type TransportFuture<'a, T> =
	Pin<Box<dyn Future<Output = Result<T, TransportError>> + 'a + Send>>;

/// Stream of raw body chunks from a long-lived response.
///
/// Dropping the stream releases the underlying connection.
pub type ByteStream = BoxStream<'static, Result<Vec<u8>, TransportError>>;

/// HTTP verbs used by the API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
	/// `GET`
	Get,
	/// `POST`
	Post,
	/// `PUT`
	Put,
	/// `DELETE`
	Delete,
}
impl Method {
	/// Returns the canonical upper-case verb.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
			Method::Put => "PUT",
			Method::Delete => "DELETE",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Fully resolved outbound request.
#[derive(Clone)]
pub struct HttpRequest {
	/// HTTP verb.
	pub method: Method,
	/// Absolute URL.
	pub url: Url,
	/// Header name/value pairs.
	pub headers: Vec<(&'static str, String)>,
	/// Serialized JSON body, if any.
	pub body: Option<Vec<u8>>,
}
impl HttpRequest {
	/// Creates a request without headers or body.
	pub fn new(method: Method, url: Url) -> Self {
		Self { method, url, headers: Vec::new(), body: None }
	}

	/// Appends a header.
	pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
		self.headers.push((name, value.into()));

		self
	}

	/// Sets the body.
	pub fn body(mut self, body: Vec<u8>) -> Self {
		self.body = Some(body);

		self
	}

	/// Looks up the first header with the given name (case-insensitive).
	pub fn header_value(&self, name: &str) -> Option<&str> {
		self.headers
			.iter()
			.find(|(key, _)| key.eq_ignore_ascii_case(name))
			.map(|(_, value)| value.as_str())
	}
}
impl Debug for HttpRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let headers = self
			.headers
			.iter()
			.map(|(name, value)| {
				if name.eq_ignore_ascii_case("authorization") {
					(*name, "<redacted>")
				} else {
					(*name, value.as_str())
				}
			})
			.collect::<Vec<_>>();

		f.debug_struct("HttpRequest")
			.field("method", &self.method)
			.field("url", &self.url.as_str())
			.field("headers", &headers)
			.field("body_len", &self.body.as_ref().map(Vec::len))
			.finish()
	}
}

/// Buffered response.
#[derive(Clone, Debug)]
pub struct HttpResponse {
	/// HTTP status code.
	pub status: u16,
	/// Raw body bytes.
	pub body: Vec<u8>,
}
impl HttpResponse {
	/// Builds a response from a status and body.
	pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
		Self { status, body: body.into() }
	}

	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

/// Streaming response: the status plus a chunk stream that owns the connection.
pub struct StreamResponse {
	/// HTTP status code.
	pub status: u16,
	/// Body chunks in arrival order.
	pub body: ByteStream,
}
impl Debug for StreamResponse {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("StreamResponse").field("status", &self.status).finish_non_exhaustive()
	}
}

/// Abstraction over HTTP stacks capable of executing API calls.
///
/// Implementations must be `Send + Sync + 'static` so a single transport can be shared by
/// every clone of a client, and the futures they return must be `Send` so callers can hop
/// executors. Dropping a returned future must abort the in-flight call; the client relies
/// on this to enforce per-call timeouts.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Dispatches `request` and buffers the whole response body.
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_, HttpResponse>;

	/// Dispatches `request` and returns once headers arrive, leaving the body as a stream.
	fn open_stream(&self, request: HttpRequest) -> TransportFuture<'_, StreamResponse>;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	fn build(&self, request: HttpRequest) -> reqwest::RequestBuilder {
		let method = match request.method {
			Method::Get => reqwest::Method::GET,
			Method::Post => reqwest::Method::POST,
			Method::Put => reqwest::Method::PUT,
			Method::Delete => reqwest::Method::DELETE,
		};
		let mut builder = self.0.request(method, request.url);

		for (name, value) in request.headers {
			builder = builder.header(name, value);
		}
		if let Some(body) = request.body {
			builder = builder.body(body);
		}

		builder
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_, HttpResponse> {
		let builder = self.build(request);

		Box::pin(async move {
			let response = builder.send().await?;
			let status = response.status().as_u16();
			let body = response.bytes().await?.to_vec();

			Ok(HttpResponse { status, body })
		})
	}

	fn open_stream(&self, request: HttpRequest) -> TransportFuture<'_, StreamResponse> {
		let builder = self.build(request);

		Box::pin(async move {
			let response = builder.send().await?;
			let status = response.status().as_u16();
			let body = response
				.bytes_stream()
				.map_ok(|chunk| chunk.to_vec())
				.map_err(TransportError::from)
				.boxed();

			Ok(StreamResponse { status, body })
		})
	}
}

/// Unwraps the optional `{ "data": … }` envelope some endpoints use.
///
/// Resource bodies that merely carry a `data` field of their own (transactions, token
/// payloads) are left untouched.
pub fn unwrap_envelope(value: Value) -> Value {
	match value {
		Value::Object(mut map) if is_envelope(&map) => map.remove("data").unwrap_or(Value::Null),
		other => other,
	}
}

fn is_envelope(map: &serde_json::Map<String, Value>) -> bool {
	matches!(map.get("data"), Some(Value::Object(_) | Value::Array(_)))
		&& !map.contains_key("txnId")
		&& !map.contains_key("accessToken")
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	#[test]
	fn envelope_is_unwrapped_only_when_present() {
		assert_eq!(unwrap_envelope(json!({"data": {"a": 1}})), json!({"a": 1}));
		assert_eq!(unwrap_envelope(json!({"data": [1, 2]})), json!([1, 2]));
		assert_eq!(
			unwrap_envelope(json!({"data": {"a": 1}, "meta": {"page": 1}})),
			json!({"a": 1})
		);
		assert_eq!(unwrap_envelope(json!({"a": 1})), json!({"a": 1}));
		assert_eq!(unwrap_envelope(json!({"data": "plain"})), json!({"data": "plain"}));
		assert_eq!(
			unwrap_envelope(json!({"txnId": "t", "data": {"memo": "x"}})),
			json!({"txnId": "t", "data": {"memo": "x"}})
		);
	}

	#[test]
	fn request_debug_redacts_authorization() {
		let request = HttpRequest::new(
			Method::Get,
			Url::parse("https://api.example.com/x").expect("Fixture URL should parse."),
		)
		.header("Authorization", "Bearer live-token")
		.header("Content-Type", "application/json");

		assert_eq!(request.header_value("authorization"), Some("Bearer live-token"));

		let rendered = format!("{request:?}");

		assert!(!rendered.contains("live-token"));
		assert!(rendered.contains("application/json"));
	}

	#[test]
	fn success_range_is_2xx() {
		assert!(HttpResponse::new(200, "").is_success());
		assert!(HttpResponse::new(204, "").is_success());
		assert!(!HttpResponse::new(301, "").is_success());
		assert!(!HttpResponse::new(500, "").is_success());
	}
}
