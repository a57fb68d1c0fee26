//! Demonstrates authenticating against a mocked Payrail API, waiting for a transaction to
//! settle, and replaying its state changes from the event stream.

// std
use std::time::Duration;
// crates.io
use color_eyre::Result;
use futures::StreamExt;
use httpmock::prelude::*;
// self
use payrail::{auth::TxnId, client::Client, config::ClientConfig, workflow::WaitOptions};

const TXN: &str = "3f1c2a8e-6d7b-4c1e-9a0f-5b2d8e7c6a41";

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/v1/auth/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"accountId\":\"acct-demo\",\"accessToken\":\"demo-access\",\"expiredAt\":\"2099-01-01T00:00:00Z\"}",
			);
		})
		.await;
	let _txn_mock = server
		.mock_async(|when, then| {
			when.method(GET).path(format!("/v1/accounts/acct-demo/transactions/{TXN}"));
			then.status(200)
				.header("content-type", "application/json")
				.body(format!("{{\"txnId\":\"{TXN}\",\"state\":\"completed\",\"amount\":\"0.001\"}}"));
		})
		.await;
	let _events_mock = server
		.mock_async(|when, then| {
			when.method(GET).path(format!("/v1/accounts/acct-demo/transactions/{TXN}/events"));
			then.status(200).header("content-type", "text/event-stream").body(format!(
				"data: {{\"txnId\":\"{TXN}\",\"state\":\"srccreated\"}}\n\ndata: {{\"txnId\":\"{TXN}\",\"state\":\"completed\"}}\n\n"
			));
		})
		.await;
	let config = ClientConfig::builder("demo-key", "demo-secret")
		.base_url(server.url("/v1"))
		.debug(true)
		.build()?;
	let client = Client::new(config)?;
	let txn = TxnId::new(TXN)?;
	let settled = client
		.transactions()
		.wait_for_completion(
			&txn,
			WaitOptions::default()
				.interval(Duration::from_millis(250))
				.on_state_change(|state| println!("Transaction moved to {state}.")),
		)
		.await?;

	println!("Final state: {}.", settled.state);

	let mut events = client.transactions().events(&txn, Duration::from_secs(10))?;

	while let Some(event) = events.next().await {
		println!("Replayed event: {}.", event?.state);
	}

	token_mock.assert_async().await;

	Ok(())
}
