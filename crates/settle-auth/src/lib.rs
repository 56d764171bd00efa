//! # Settlement Request Authentication
//!
//! Signed request transport between the network and its providers.
//!
//! ## Request Flow
//!
//! ```text
//! client                                   server
//! ──────                                   ──────
//! RpcClient::call                          serve(router)
//!   │                                        │
//!   ▼                                        ▼
//! SigningLayer                             TraceLayer
//!   buffer body, sign digest,                │
//!   attach X-Public-Key / X-Signature /      ▼
//!   X-Signature-Timestamp                  VerificationLayer
//!   │                                        parse headers, replay window,
//!   ▼                                        bounded body read, verify;
//! HttpTransport (reqwest) ──── HTTP ────►    record outcome, always continue
//!                                            │
//!                                            ▼
//!                                          RpcRouter
//!                                            SignatureErrorInterceptor
//!                                              failed outcome → typed error
//!                                            other interceptors
//!                                            decode JSON → handler
//! ```
//!
//! ## Protocol Versions
//!
//! - **v1**: digest = `keccak256(body)`
//! - **v2** (default): digest = `keccak256(timestamp_ms_le_i64 || body)`, and
//!   the timestamp must be within ±60s of the receiver's clock
//!
//! ## Usage
//!
//! ```ignore
//! use settle_auth::{serve, AuthenticatedHandler, RpcClient, RpcRouter, ServerConfig};
//!
//! let rpc = RpcRouter::new().unary("/settlement.v1.ProviderService/PayOut", pay_out);
//! let router = AuthenticatedHandler::builder()
//!     .expected_public_key(network_public_key)
//!     .build(rpc)?;
//! let server = serve(router, &ServerConfig::default()).await?;
//!
//! let client = RpcClient::builder()
//!     .base_url("https://provider.example")
//!     .private_key_hex(private_key)
//!     .build()?;
//! let reply: PayOutReply = client
//!     .call("/settlement.v1.ProviderService/PayOut", &request)
//!     .await?;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod adapters;
pub mod client;
pub mod domain;
pub mod handler;
pub mod middleware;
pub mod ports;
pub mod rpc;
pub mod service;

// Re-export public API
pub use adapters::HttpTransport;
pub use client::{RpcClient, RpcClientBuilder};
pub use domain::config::{ClientConfig, HandlerConfig, ServerConfig};
pub use domain::error::{
    CheckError, ClientError, Code, ConfigError, HeaderError, RpcError, ServerError,
    TransportError, VerificationError,
};
pub use domain::headers::{
    signing_digest, signing_message, ProtocolVersion, SignatureHeaders, DEFAULT_MAX_BODY_SIZE,
    PUBLIC_KEY_HEADER, SIGNATURE_HEADER, TIMESTAMP_HEADER, TIMESTAMP_TOLERANCE_MS,
};
pub use domain::outcome::VerificationOutcome;
pub use handler::{AuthenticatedHandler, AuthenticatedHandlerBuilder};
pub use middleware::{SigningLayer, SigningService, VerificationConfig, VerificationLayer};
pub use ports::check::{KeccakSignatureCheck, SignatureCheck};
pub use ports::clock::{Clock, SystemClock};
pub use rpc::{Interceptor, Next, RpcRequest, RpcRouter, SignatureErrorInterceptor};
pub use service::{serve, ServerHandle};
