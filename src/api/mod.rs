//! Transport to the advisory and defect APIs: OAuth tokens and an
//! authenticated GET client.

pub mod auth;
pub mod client;

pub use auth::{ClientCredentialsAuth, StaticToken, Token, TokenProvider};
pub use client::ApiClient;
