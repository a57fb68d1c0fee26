//! Strongly typed identifiers for accounts and transactions.

// std
use std::{borrow::Borrow, ops::Deref};
// crates.io
use uuid::Uuid;
// self
use crate::{_prelude::*, error::ValidationError};

macro_rules! def_id {
	($name:ident, $doc:literal, $kind:literal) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Creates a new identifier after validation.
			pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
				let view = value.as_ref();

				validate_view($kind, view)?;

				Ok(Self(view.to_owned()))
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				validate_view($kind, &value)?;

				Ok(Self(value))
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
	};
}

const IDENTIFIER_MAX_LEN: usize = 128;
const CANONICAL_LEN: usize = 36;
const RESERVED: &[char] = &['/', '?', '#', '%', '\\'];

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty or whitespace.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier (account, transaction).
		kind: &'static str,
	},
	/// The identifier contains whitespace characters.
	#[error("{kind} identifier contains whitespace.")]
	ContainsWhitespace {
		/// Kind of identifier (account, transaction).
		kind: &'static str,
	},
	/// The identifier contains a character reserved in URL paths.
	#[error("{kind} identifier contains the reserved character `{character}`.")]
	ReservedCharacter {
		/// Kind of identifier (account, transaction).
		kind: &'static str,
		/// Offending character.
		character: char,
	},
	/// The identifier exceeded the allowed character count.
	#[error("{kind} identifier exceeds {max} characters.")]
	TooLong {
		/// Kind of identifier (account, transaction).
		kind: &'static str,
		/// Maximum permitted character count.
		max: usize,
	},
}

def_id! { AccountId, "Account identifier issued by the token endpoint.", "Account" }
def_id! { TxnId, "Opaque transaction identifier owned by the remote API.", "Transaction" }

impl TxnId {
	/// Checks that the identifier is a lowercase, hyphenated UUID.
	///
	/// Long-lived endpoints (event streams) only accept this form.
	pub fn ensure_canonical(&self) -> Result<(), ValidationError> {
		let canonical = self.0.len() == CANONICAL_LEN
			&& !self.0.bytes().any(|b| b.is_ascii_uppercase())
			&& Uuid::try_parse(&self.0).is_ok();

		if canonical {
			Ok(())
		} else {
			Err(ValidationError::NonCanonicalId { value: self.0.clone() })
		}
	}
}

fn validate_view(kind: &'static str, view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if view.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace { kind });
	}
	if let Some(character) = view.chars().find(|c| RESERVED.contains(c)) {
		return Err(IdentifierError::ReservedCharacter { kind, character });
	}
	if view.len() > IDENTIFIER_MAX_LEN {
		return Err(IdentifierError::TooLong { kind, max: IDENTIFIER_MAX_LEN });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// std
	use std::collections::HashMap;
	// self
	use super::*;

	#[test]
	fn identifiers_reject_whitespace_and_empty() {
		assert!(TxnId::new(" txn-123").is_err(), "Leading whitespace must be rejected.");
		assert!(TxnId::new("txn-123 ").is_err(), "Trailing whitespace must be rejected.");

		let txn = TxnId::new("txn-123").expect("Transaction fixture should be considered valid.");

		assert_eq!(txn.as_ref(), "txn-123");
		assert!(AccountId::new("").is_err());
		assert!(AccountId::new("with space").is_err());
		assert!(matches!(
			TxnId::new("../admin"),
			Err(IdentifierError::ReservedCharacter { character: '/', .. })
		));
		assert!(TxnId::new("a?b=1").is_err());
	}

	#[test]
	fn serde_round_trip_enforces_validation() {
		let account: AccountId =
			serde_json::from_str("\"acct-42\"").expect("Account should deserialize successfully.");

		assert_eq!(account.as_ref(), "acct-42");
		assert!(serde_json::from_str::<AccountId>("\"with space\"").is_err());
		assert!(serde_json::from_str::<TxnId>("\"\"").is_err());
	}

	#[test]
	fn unicode_whitespace_and_length_limits() {
		let nbsp = format!("txn{}id", '\u{00A0}');

		assert!(TxnId::new(&nbsp).is_err());

		let exact = "a".repeat(IDENTIFIER_MAX_LEN);

		TxnId::new(&exact).expect("Exact length should succeed.");

		let too_long = "a".repeat(IDENTIFIER_MAX_LEN + 1);

		assert!(TxnId::new(&too_long).is_err());
	}

	#[test]
	fn canonical_form_requires_lowercase_hyphenated_uuid() {
		let ok = TxnId::new("3f1c2a8e-6d7b-4c1e-9a0f-5b2d8e7c6a41")
			.expect("UUID fixture should be a valid identifier.");

		ok.ensure_canonical().expect("Lowercase hyphenated UUID should be canonical.");

		for raw in [
			"3F1C2A8E-6D7B-4C1E-9A0F-5B2D8E7C6A41",
			"3f1c2a8e6d7b4c1e9a0f5b2d8e7c6a41",
			"{3f1c2a8e-6d7b-4c1e-9a0f-5b2d8e7c6a41}",
			"txn-123",
			"..",
		] {
			let id = TxnId::new(raw).expect("Fixture should pass structural validation.");

			assert!(
				matches!(id.ensure_canonical(), Err(ValidationError::NonCanonicalId { .. })),
				"{raw} must not be canonical."
			);
		}
	}

	#[test]
	fn borrow_supports_fast_lookup() {
		let map: HashMap<TxnId, u8> = HashMap::from_iter([(
			TxnId::new("txn-123").expect("Transaction used for lookup should be valid."),
			7_u8,
		)]);

		assert_eq!(map.get("txn-123"), Some(&7));
	}
}
