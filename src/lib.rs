//! Typed async client for the Payrail payments API: signed token lifecycle, a retrying
//! transport core, and transaction polling and streaming workflows in one crate.
//!
//! ```no_run
//! # async fn run() -> payrail::error::Result<()> {
//! use payrail::{
//! 	auth::TxnId,
//! 	client::Client,
//! 	config::ClientConfig,
//! 	workflow::WaitOptions,
//! };
//!
//! let config = ClientConfig::builder("api-key", "api-secret").build()?;
//! let client = Client::new(config)?;
//! let txn = TxnId::new("3f1c2a8e-6d7b-4c1e-9a0f-5b2d8e7c6a41")?;
//! let settled = client
//! 	.transactions()
//! 	.wait_for_completion(&txn, WaitOptions::default().on_state_change(|state| {
//! 		println!("transaction moved to {state}");
//! 	}))
//! 	.await?;
//!
//! println!("final state: {}", settled.state);
//! # Ok(())
//! # }
//! ```

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod http;
pub mod obs;
pub mod retry;
pub mod transaction;
pub mod workflow;

mod _prelude {
	pub use std::{
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
		time::Duration,
	};

	pub use parking_lot::RwLock;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize, de::DeserializeOwned};
	pub use serde_json::Value;
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
