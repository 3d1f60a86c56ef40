//! # whatsapp-gateway
//!
//! Rust client for a WhatsApp gateway REST API.
//!
//! ## Features
//!
//! - Sending text, media and location messages ([`MessageGateway`])
//! - QR code session pairing: start, fetch QR, poll status ([`QrSession`])
//! - Credentials from explicit values or a host-supplied lookup ([`ClientCredentials`])
//! - Pluggable HTTP [`Transport`] (`reqwest` by default)
//!
//! The client never retries, schedules or persists anything; polling cadence, timeouts and
//! cancellation belong to the caller.
//!
//! ## Example
//!
//! ```ignore
//! use whatsapp_gateway::{ClientCredentials, QrSession};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let creds = ClientCredentials::from_env(None, None)?;
//!     let session = QrSession::new("my-shop", creds);
//!     let started = session.start().await?;
//!     let qr = session.fetch_qr(&started.qr_endpoint).await?;
//!     println!("scan: {qr}");
//!     let status = session.check_status().await?;
//!     println!("status: {}", status.status());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod pairing;
pub mod transport;
pub mod types;

pub use client::{MessageGateway, SendLocationParams, SendMediaParams, SendMessageParams};
pub use config::ClientCredentials;
pub use error::{
    ConfigError, Error, GatewayError, HandshakeError, HandshakeStep, Result, TransportError,
};
pub use pairing::{QrSession, QrSessionResult};
pub use transport::Transport;
#[cfg(feature = "reqwest")]
pub use transport::ReqwestTransport;
pub use types::{
    ApiErrorDetail, ApiResult, QrEndpoint, QrPayload, SessionId, SessionState, SessionStatus,
};
