#![cfg(feature = "reqwest")]

// std
use std::time::Duration;
// crates.io
use futures::StreamExt;
use httpmock::prelude::*;
// self
use payrail::{
	auth::TxnId,
	client::{Client, ReqwestPayrailClient},
	config::ClientConfig,
	transaction::TransactionState,
};

const TXN: &str = "0b8e7f3c-2a51-4d9e-8c6b-1f4a7e2d9c30";

fn build_client(server: &MockServer) -> ReqwestPayrailClient {
	let config = ClientConfig::builder("live-key", "live-secret")
		.base_url(server.url("/v1"))
		.timeout(Duration::from_secs(5))
		.build()
		.expect("Config pointing at the mock server should build.");

	Client::new(config).expect("Reqwest client should build.")
}

async fn mock_token(server: &MockServer) -> httpmock::Mock<'_> {
	server
		.mock_async(|when, then| {
			when.method(POST).path("/v1/auth/token").header("content-type", "application/json");
			then.status(200).header("content-type", "application/json").body(
				"{\"data\":{\"accountId\":\"acct-live\",\"accessToken\":\"live-token\",\"expiredAt\":\"2099-01-01T00:00:00Z\"}}",
			);
		})
		.await
}

fn txn_id() -> TxnId {
	TxnId::new(TXN).expect("Transaction fixture should be valid.")
}

#[tokio::test]
async fn authenticates_then_fetches_enveloped_transactions() {
	let server = MockServer::start_async().await;
	let token = mock_token(&server).await;
	let fetch = server
		.mock_async(|when, then| {
			when.method(GET)
				.path(format!("/v1/accounts/acct-live/transactions/{TXN}"))
				.header("authorization", "Bearer live-token");
			then.status(200).header("content-type", "application/json").body(format!(
				"{{\"data\":{{\"txnId\":\"{TXN}\",\"state\":\"srcconfirmed\",\"rail\":\"lightning\"}}}}"
			));
		})
		.await;
	let client = build_client(&server);
	let first = client.transactions().get(&txn_id()).await.expect("Fetch should succeed.");
	let second = client.transactions().get(&txn_id()).await.expect("Second fetch should succeed.");

	assert_eq!(first.state, TransactionState::SrcConfirmed);
	assert_eq!(first.extra.get("rail"), Some(&serde_json::json!("lightning")));
	assert_eq!(first, second);

	token.assert_calls_async(1).await;
	fetch.assert_calls_async(2).await;
}

#[tokio::test]
async fn client_errors_are_decoded_and_not_retried() {
	let server = MockServer::start_async().await;
	let _token = mock_token(&server).await;
	let quote = server
		.mock_async(|when, then| {
			when.method(POST).path("/v1/accounts/acct-live/quotes");
			then.status(422)
				.header("content-type", "application/json")
				.body("{\"message\":\"Quote expired\",\"code\":\"QUOTE_EXPIRED\"}");
		})
		.await;
	let client = build_client(&server);
	let err = client
		.post("accounts/acct-live/quotes", &serde_json::json!({ "amount": "0.001" }))
		.await
		.expect_err("A 422 should fail.");
	let api = err.as_api().expect("Failure should surface as an API error.");

	assert_eq!(api.status, 422);
	assert_eq!(api.code.as_deref(), Some("QUOTE_EXPIRED"));
	assert_eq!(api.message, "Quote expired");

	quote.assert_calls_async(1).await;
}

#[tokio::test]
async fn event_streams_decode_server_sent_frames() {
	let server = MockServer::start_async().await;
	let _token = mock_token(&server).await;
	let events = server
		.mock_async(|when, then| {
			when.method(GET)
				.path(format!("/v1/accounts/acct-live/transactions/{TXN}/events"))
				.query_param("timeoutMs", "30000")
				.header("accept", "text/event-stream");
			then.status(200).header("content-type", "text/event-stream").body(format!(
				": connected\n\ndata: {{\"txnId\":\"{TXN}\",\"state\":\"dstcreated\"}}\n\ndata: oops\n\ndata: {{\"txnId\":\"{TXN}\",\"state\":\"completed\"}}\n\n"
			));
		})
		.await;
	let client = build_client(&server);
	let states = client
		.transaction_events(&txn_id(), Duration::from_secs(30))
		.expect("Canonical id should open a stream.")
		.map(|item| item.expect("Frames should decode.").state)
		.collect::<Vec<_>>()
		.await;

	assert_eq!(states, vec![TransactionState::DstCreated, TransactionState::Completed]);

	events.assert_async().await;
}
