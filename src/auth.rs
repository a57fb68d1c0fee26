//! Credentials, request signing, sessions, and the token lifecycle manager.

pub mod id;
pub mod manager;
pub mod secret;
pub mod session;
pub mod signer;

pub use id::*;
pub use manager::{TOKEN_PATH, TokenManager, challenge_payload};
pub use secret::*;
pub use session::*;
pub use signer::*;
