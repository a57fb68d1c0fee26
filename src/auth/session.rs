//! Authenticated session records and token endpoint response parsing.

// crates.io
use time::format_description::well_known::Rfc3339;
// self
use crate::{
	_prelude::*,
	auth::{AccountId, Secret},
	http,
};

/// Session issued by the token endpoint.
///
/// Sessions are replaced as a whole; fields are never mutated in place.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
	/// Account the credentials belong to.
	pub account_id: AccountId,
	/// Bearer token; empty once invalidated.
	pub access_token: Secret,
	/// Absolute expiry reported by the server.
	pub expires_at: OffsetDateTime,
}
impl Session {
	/// Returns `true` when the token is present and `now` is before `expires_at - buffer`.
	///
	/// An expiry so early that subtracting the buffer leaves the representable range counts as
	/// already expired.
	pub fn is_valid_at(&self, now: OffsetDateTime, buffer: Duration) -> bool {
		let Ok(buffer) = time::Duration::try_from(buffer) else {
			return false;
		};

		!self.access_token.is_empty()
			&& self.expires_at.checked_sub(buffer).is_some_and(|refresh_at| now < refresh_at)
	}

	/// Copy of the session with the access token cleared.
	pub fn invalidated(&self) -> Self {
		Self {
			account_id: self.account_id.clone(),
			access_token: Secret::default(),
			expires_at: self.expires_at,
		}
	}

	/// Parses a token endpoint response body, unwrapping an optional `data` envelope.
	pub fn from_response_body(raw: &[u8]) -> Result<Self> {
		let value: Value = serde_json::from_slice(raw)
			.map_err(|e| Error::auth(format!("token endpoint returned malformed JSON ({e})")))?;
		let payload: TokenPayload = serde_path_to_error::deserialize(http::unwrap_envelope(value))
			.map_err(|e| {
				Error::auth(format!("token endpoint response is invalid at `{}`", e.path()))
			})?;

		if payload.access_token.is_empty() {
			return Err(Error::auth("token endpoint returned an empty access token"));
		}

		Ok(Self {
			account_id: payload.account_id,
			access_token: payload.access_token,
			expires_at: payload.expired_at.normalize()?,
		})
	}
}
impl Debug for Session {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Session")
			.field("account_id", &self.account_id)
			.field("access_token", &"<redacted>")
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenPayload {
	account_id: AccountId,
	access_token: Secret,
	expired_at: Expiry,
}

/// `expiredAt` arrives as epoch milliseconds (number or numeric string) or an RFC 3339 string.
#[derive(Deserialize)]
#[serde(untagged)]
enum Expiry {
	Millis(i64),
	Fractional(f64),
	Text(String),
}
impl Expiry {
	fn normalize(self) -> Result<OffsetDateTime> {
		match self {
			Self::Millis(ms) => from_epoch_millis(ms),
			Self::Fractional(ms) => from_epoch_millis(ms as i64),
			Self::Text(raw) => {
				let raw = raw.trim();

				if let Ok(ms) = raw.parse::<i64>() {
					return from_epoch_millis(ms);
				}

				OffsetDateTime::parse(raw, &Rfc3339)
					.map_err(|_| Error::auth(format!("unrecognized expiredAt value `{raw}`")))
			},
		}
	}
}

fn from_epoch_millis(ms: i64) -> Result<OffsetDateTime> {
	OffsetDateTime::from_unix_timestamp_nanos(i128::from(ms) * 1_000_000)
		.map_err(|_| Error::auth(format!("expiredAt value {ms} is out of range")))
}
