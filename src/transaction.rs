//! Transaction resources, their lifecycle states, and the transaction façade.

// self
use crate::{
	_prelude::*,
	auth::TxnId,
	client::Client,
	http::HttpTransport,
	workflow::{EventStream, WaitOptions},
};

/// Lifecycle state reported by the API, in lifecycle order.
///
/// Unknown wire values are preserved and treated as non-terminal so newer API versions do
/// not break polling.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransactionState {
	/// Unconfirmed draft returned by creation.
	Quoted,
	/// Source leg created.
	SrcCreated,
	/// Source funds confirmed.
	SrcConfirmed,
	/// Destination leg created.
	DstCreated,
	/// Settled successfully.
	Completed,
	/// Quote lapsed before confirmation.
	Expired,
	/// Refused by the API or a compliance check.
	Rejected,
	/// Failed while processing.
	Error,
	/// Canceled by the account holder.
	UserCanceled,
	/// Value this client version does not know.
	Unknown(String),
}
impl TransactionState {
	/// States from which no further transition occurs.
	pub const TERMINAL: [TransactionState; 5] = [
		TransactionState::Completed,
		TransactionState::Expired,
		TransactionState::Rejected,
		TransactionState::Error,
		TransactionState::UserCanceled,
	];

	/// Returns `true` for terminal states.
	pub fn is_terminal(&self) -> bool {
		Self::TERMINAL.contains(self)
	}

	/// Position in the lifecycle; terminal states share the last stage.
	pub fn stage(&self) -> u8 {
		match self {
			Self::Quoted => 0,
			Self::SrcCreated => 1,
			Self::SrcConfirmed => 2,
			Self::DstCreated => 3,
			Self::Completed | Self::Expired | Self::Rejected | Self::Error | Self::UserCanceled => 4,
			Self::Unknown(_) => u8::MAX,
		}
	}

	/// Wire representation.
	pub fn as_str(&self) -> &str {
		match self {
			Self::Quoted => "quoted",
			Self::SrcCreated => "srccreated",
			Self::SrcConfirmed => "srcconfirmed",
			Self::DstCreated => "dstcreated",
			Self::Completed => "completed",
			Self::Expired => "expired",
			Self::Rejected => "rejected",
			Self::Error => "error",
			Self::UserCanceled => "usercanceled",
			Self::Unknown(raw) => raw,
		}
	}
}
impl From<String> for TransactionState {
	fn from(value: String) -> Self {
		match value.to_ascii_lowercase().as_str() {
			"quoted" => Self::Quoted,
			"srccreated" => Self::SrcCreated,
			"srcconfirmed" => Self::SrcConfirmed,
			"dstcreated" => Self::DstCreated,
			"completed" => Self::Completed,
			"expired" => Self::Expired,
			"rejected" => Self::Rejected,
			"error" => Self::Error,
			"usercanceled" | "user-canceled" | "user_canceled" => Self::UserCanceled,
			_ => Self::Unknown(value),
		}
	}
}
impl From<TransactionState> for String {
	fn from(value: TransactionState) -> Self {
		match value {
			TransactionState::Unknown(raw) => raw,
			known => known.as_str().to_owned(),
		}
	}
}
impl Display for TransactionState {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Transaction resource as returned by the API.
///
/// Only the identifier and state are interpreted; every other field is kept verbatim.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
	/// Remote identifier.
	pub txn_id: TxnId,
	/// Current lifecycle state.
	pub state: TransactionState,
	/// Remaining fields (amounts, rails, quotes, …).
	#[serde(flatten)]
	pub extra: serde_json::Map<String, Value>,
}

/// One state-change event from a transaction event stream.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionEvent {
	/// Transaction the event belongs to.
	pub txn_id: TxnId,
	/// State after the change.
	pub state: TransactionState,
	/// Server timestamp, when supplied.
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub occurred_at: Option<OffsetDateTime>,
	/// Remaining fields.
	#[serde(flatten)]
	pub extra: serde_json::Map<String, Value>,
}

/// Borrowed façade for transaction endpoints.
pub struct Transactions<'a, T>
where
	T: ?Sized + HttpTransport,
{
	client: &'a Client<T>,
}
impl<'a, T> Transactions<'a, T>
where
	T: ?Sized + HttpTransport,
{
	pub(crate) fn new(client: &'a Client<T>) -> Self {
		Self { client }
	}

	/// Fetches the current transaction resource.
	pub async fn get(&self, id: &TxnId) -> Result<Transaction> {
		let path = self.path(id, None).await?;

		self.client.get_as(&path).await
	}

	/// Confirms (executes) a quoted transaction.
	pub async fn confirm(&self, id: &TxnId) -> Result<Transaction> {
		let path = self.path(id, Some("confirm")).await?;

		self.client.put_as(&path, &serde_json::json!({})).await
	}

	/// Cancels a transaction when the API variant supports it.
	///
	/// With `cancel_supported` disabled the call fails locally, because unconfirmed
	/// transactions expire on their own.
	pub async fn cancel(&self, id: &TxnId) -> Result<Transaction> {
		if !self.client.config().cancel_supported {
			return Err(Error::Unsupported {
				operation: "Transaction cancel",
				reason: "unconfirmed transactions expire automatically",
			});
		}

		let path = self.path(id, Some("cancel")).await?;

		self.client.put_as(&path, &serde_json::json!({})).await
	}

	/// Polls until the transaction reaches a terminal state.
	pub async fn wait_for_completion(
		&self,
		id: &TxnId,
		options: WaitOptions,
	) -> Result<Transaction> {
		self.client.wait_for_completion(id, options).await
	}

	/// Opens a lazy event stream for the transaction.
	pub fn events(&self, id: &TxnId, timeout: Duration) -> Result<EventStream> {
		self.client.transaction_events(id, timeout)
	}

	async fn path(&self, id: &TxnId, action: Option<&str>) -> Result<String> {
		let account = self.client.ensure_auth_and_get_account_id().await?;

		Ok(match action {
			Some(action) => format!("accounts/{account}/transactions/{id}/{action}"),
			None => format!("accounts/{account}/transactions/{id}"),
		})
	}
}
impl<T> Debug for Transactions<'_, T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("Transactions(..)")
	}
}
