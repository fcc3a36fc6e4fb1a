//! # blackoin - Blackoin payment API client
//!
//! A Rust client for the Blackoin payment API: bearer token issuance, PIX and
//! crypto charges, withdraws, status lookups and payment-method listing.
//!
//! Every call goes through [`RequestExecutor`], which authenticates the
//! request from a [`GatewayConfig`], sends it once and treats only HTTP 200
//! as success. Resource operations then inspect the `{success, data,
//! message}` envelope and return a typed result or a [`BlackoinError`]
//! carrying the message, the raw upstream error text and the status code.
//!
//! ```rust,no_run
//! # use blackoin::{BlackoinClient, GatewayConfig, Client, Payment, PixPayment};
//! # async fn run() -> blackoin::Result<()> {
//! let config = GatewayConfig::new()
//!     .with_debug(true)
//!     .with_credentials("client-id", "client-secret")?;
//! let mut client = BlackoinClient::new(config);
//! client.authenticate().await?;
//!
//! let customer = Client::new().with_name("Maria Silva").with_document("12345678901");
//! let charge = PixPayment::new(Payment::new(1500, "pix-method-hash", customer)?);
//! let created = client.create_pix_payment(&charge).await?;
//! println!("{} {}", created.txid, created.pix_copia_e_cola);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod http;
pub mod mask;
pub mod request;
pub mod resources;
pub mod responses;
pub mod types;

// Re-exports for convenience
pub use client::BlackoinClient;
pub use config::{Environment, GatewayConfig};
pub use error::{BlackoinError, Operation, Result};
pub use crate::http::{HttpMethod, HttpRequest};
pub use request::RequestExecutor;
pub use resources::payments::{CryptoPayment, Payment, PaymentVariant, PixPayment};
pub use resources::withdrawals::{CryptoWithdraw, PixWithdraw, Withdraw, WithdrawVariant};
pub use responses::*;
pub use types::{Amount, Client, Receiver};

/// Current version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
