//! Client configuration and its validating builder.

// self
use crate::{_prelude::*, auth::Secret, retry::RetryPolicy};

/// Validated client configuration.
#[derive(Clone)]
pub struct ClientConfig {
	/// Public API key.
	pub api_key: String,
	/// Signing secret; only ever used as the HMAC key.
	pub api_secret: Secret,
	/// Base URL every request path is appended to.
	pub base_url: Url,
	/// Per-call HTTP timeout.
	pub timeout: Duration,
	/// Additional attempts for retryable failures.
	pub max_retries: u32,
	/// Emits timestamped request/auth lines on the `payrail::debug` target.
	pub debug: bool,
	/// Lead time before expiry at which the session is refreshed.
	pub refresh_buffer: Duration,
	/// Whether the API variant accepts `PUT …/cancel` on transactions.
	pub cancel_supported: bool,
}
impl ClientConfig {
	/// Default API endpoint.
	pub const DEFAULT_BASE_URL: &'static str = "https://api.payrail.io/v1";
	/// Default per-call timeout.
	pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);
	/// Default refresh buffer.
	pub const DEFAULT_REFRESH_BUFFER: Duration = Duration::from_millis(60_000);

	/// Starts a builder for the given credentials.
	pub fn builder(
		api_key: impl Into<String>,
		api_secret: impl Into<Secret>,
	) -> ClientConfigBuilder {
		ClientConfigBuilder::new(api_key, api_secret)
	}

	/// Retry policy derived from `max_retries`.
	pub fn retry_policy(&self) -> RetryPolicy {
		RetryPolicy::exponential(self.max_retries)
	}

	/// Joins `path` onto the base URL, tolerating missing or duplicated slashes.
	pub fn endpoint(&self, path: &str) -> Result<Url> {
		let base = self.base_url.as_str().trim_end_matches('/');
		let path = path.trim_start_matches('/');
		let joined = format!("{base}/{path}");

		Url::parse(&joined).map_err(|source| {
			crate::error::ConfigError::InvalidBaseUrl { value: joined, source }.into()
		})
	}
}
impl Debug for ClientConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientConfig")
			.field("api_key", &self.api_key)
			.field("api_secret", &"<redacted>")
			.field("base_url", &self.base_url.as_str())
			.field("timeout", &self.timeout)
			.field("max_retries", &self.max_retries)
			.field("debug", &self.debug)
			.field("refresh_buffer", &self.refresh_buffer)
			.field("cancel_supported", &self.cancel_supported)
			.finish()
	}
}

/// Builder for [`ClientConfig`] values.
#[derive(Debug)]
pub struct ClientConfigBuilder {
	/// Public API key.
	pub api_key: String,
	/// Signing secret.
	pub api_secret: Secret,
	/// Base URL (unparsed until [`build`](Self::build)).
	pub base_url: String,
	/// Per-call HTTP timeout.
	pub timeout: Duration,
	/// Additional attempts for retryable failures.
	pub max_retries: u32,
	/// Debug-mode flag.
	pub debug: bool,
	/// Refresh buffer.
	pub refresh_buffer: Duration,
	/// Transaction cancel capability flag.
	pub cancel_supported: bool,
}
impl ClientConfigBuilder {
	/// Creates a builder seeded with credentials and defaults.
	pub fn new(api_key: impl Into<String>, api_secret: impl Into<Secret>) -> Self {
		Self {
			api_key: api_key.into(),
			api_secret: api_secret.into(),
			base_url: ClientConfig::DEFAULT_BASE_URL.into(),
			timeout: ClientConfig::DEFAULT_TIMEOUT,
			max_retries: RetryPolicy::DEFAULT_MAX_RETRIES,
			debug: false,
			refresh_buffer: ClientConfig::DEFAULT_REFRESH_BUFFER,
			cancel_supported: false,
		}
	}

	/// Overrides the base URL.
	pub fn base_url(mut self, url: impl Into<String>) -> Self {
		self.base_url = url.into();

		self
	}

	/// Overrides the per-call timeout.
	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Overrides the retry budget.
	pub fn max_retries(mut self, max_retries: u32) -> Self {
		self.max_retries = max_retries;

		self
	}

	/// Enables or disables debug lines.
	pub fn debug(mut self, debug: bool) -> Self {
		self.debug = debug;

		self
	}

	/// Overrides the refresh buffer.
	pub fn refresh_buffer(mut self, buffer: Duration) -> Self {
		self.refresh_buffer = buffer;

		self
	}

	/// Declares whether the API variant supports transaction cancellation.
	pub fn cancel_supported(mut self, supported: bool) -> Self {
		self.cancel_supported = supported;

		self
	}

	/// Validates the builder and produces a [`ClientConfig`].
	///
	/// Missing credentials fail with [`Error::Auth`] before any network activity.
	pub fn build(self) -> Result<ClientConfig> {
		if self.api_key.trim().is_empty() {
			return Err(Error::auth("API key is required"));
		}
		if self.api_secret.is_empty() {
			return Err(Error::auth("API secret is required"));
		}

		let base_url = Url::parse(self.base_url.trim()).map_err(|source| {
			crate::error::ConfigError::InvalidBaseUrl { value: self.base_url.clone(), source }
		})?;

		if base_url.cannot_be_a_base() {
			return Err(crate::error::ConfigError::UnsupportedBaseUrl { value: self.base_url }.into());
		}

		Ok(ClientConfig {
			api_key: self.api_key,
			api_secret: self.api_secret,
			base_url,
			timeout: self.timeout,
			max_retries: self.max_retries,
			debug: self.debug,
			refresh_buffer: self.refresh_buffer,
			cancel_supported: self.cancel_supported,
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::error::ConfigError;

	#[test]
	fn defaults_match_documented_values() {
		let config = ClientConfig::builder("key", "secret")
			.build()
			.expect("Config with credentials should build.");

		assert_eq!(config.base_url.as_str(), "https://api.payrail.io/v1");
		assert_eq!(config.timeout, Duration::from_millis(30_000));
		assert_eq!(config.max_retries, 2);
		assert_eq!(config.refresh_buffer, Duration::from_millis(60_000));
		assert!(!config.debug);
		assert!(!config.cancel_supported);
	}

	#[test]
	fn missing_credentials_fail_with_auth_errors() {
		let err = ClientConfig::builder("", "secret").build().expect_err("Empty key must fail.");

		assert!(matches!(err, Error::Auth { status: None, .. }));

		let err = ClientConfig::builder("key", "  ").build().expect_err("Blank secret must fail.");

		assert!(matches!(err, Error::Auth { status: None, .. }));
	}

	#[test]
	fn invalid_base_urls_are_config_errors() {
		let err = ClientConfig::builder("key", "secret")
			.base_url("not a url")
			.build()
			.expect_err("Unparsable base URL must fail.");

		assert!(matches!(err, Error::Config(ConfigError::InvalidBaseUrl { .. })));

		let err = ClientConfig::builder("key", "secret")
			.base_url("mailto:ops@example.com")
			.build()
			.expect_err("Non-hierarchical base URL must fail.");

		assert!(matches!(err, Error::Config(ConfigError::UnsupportedBaseUrl { .. })));
	}

	#[test]
	fn endpoint_joins_paths_with_single_slash() {
		let config = ClientConfig::builder("key", "secret")
			.base_url("https://api.example.com/v2/")
			.build()
			.expect("Config should build.");

		assert_eq!(
			config.endpoint("/auth/token").expect("Endpoint should join.").as_str(),
			"https://api.example.com/v2/auth/token"
		);
		assert_eq!(
			config.endpoint("accounts/a/transactions").expect("Endpoint should join.").as_str(),
			"https://api.example.com/v2/accounts/a/transactions"
		);
	}

	#[test]
	fn debug_output_redacts_secret() {
		let config = ClientConfig::builder("key", "hunter2").build().expect("Config should build.");

		assert!(!format!("{config:?}").contains("hunter2"));
	}
}
