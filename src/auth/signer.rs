//! HMAC-SHA256 request signer keyed with the API secret.

// crates.io
use hmac::{Hmac, Mac};
use sha2::Sha256;
// self
use crate::{_prelude::*, auth::Secret};

type HmacSha256 = Hmac<Sha256>;

/// Computes request signatures from the client credentials.
///
/// The signed message is `{api_key}&payload={payload}`; the digest is rendered as lowercase hex.
/// The keyed MAC is prepared once and cloned per signature, so signing never fails.
#[derive(Clone)]
pub struct Signer {
	api_key: String,
	mac: HmacSha256,
}
impl Signer {
	/// Prepares a signer for the given key pair.
	pub fn new(api_key: impl Into<String>, api_secret: &Secret) -> Result<Self> {
		let mac = HmacSha256::new_from_slice(api_secret.expose().as_bytes())
			.map_err(|_| Error::auth("API secret cannot be used as an HMAC key"))?;

		Ok(Self { api_key: api_key.into(), mac })
	}

	/// Public identifier the signatures are bound to.
	pub fn api_key(&self) -> &str {
		&self.api_key
	}

	/// Signs `payload`, returning the lowercase hex digest.
	pub fn sign(&self, payload: &[u8]) -> String {
		let mut mac = self.mac.clone();

		mac.update(self.api_key.as_bytes());
		mac.update(b"&payload=");
		mac.update(payload);

		hex::encode(mac.finalize().into_bytes())
	}
}
impl Debug for Signer {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Signer")
			.field("api_key", &self.api_key)
			.field("api_secret", &"<redacted>")
			.finish()
	}
}
