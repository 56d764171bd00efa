//! Server-side wiring: verification layer outside, signature interceptor
//! first in the RPC chain.

use crate::domain::config::HandlerConfig;
use crate::domain::error::ConfigError;
use crate::domain::headers::{ProtocolVersion, DEFAULT_MAX_BODY_SIZE};
use crate::middleware::verify::{VerificationConfig, VerificationLayer};
use crate::ports::check::{KeccakSignatureCheck, SignatureCheck};
use crate::ports::clock::Clock;
use crate::rpc::{RpcRouter, SignatureErrorInterceptor};
use std::sync::Arc;
use tracing::info;

/// Entry point for building an authenticated RPC server.
pub struct AuthenticatedHandler;

impl AuthenticatedHandler {
    pub fn builder() -> AuthenticatedHandlerBuilder {
        AuthenticatedHandlerBuilder::default()
    }
}

pub struct AuthenticatedHandlerBuilder {
    expected_public_key: Option<String>,
    signature_check: Option<Arc<dyn SignatureCheck>>,
    max_body_size: usize,
    protocol: ProtocolVersion,
    clock: Option<Arc<dyn Clock>>,
}

impl Default for AuthenticatedHandlerBuilder {
    fn default() -> Self {
        Self {
            expected_public_key: None,
            signature_check: None,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            protocol: ProtocolVersion::default(),
            clock: None,
        }
    }
}

impl AuthenticatedHandlerBuilder {
    pub fn from_config(config: &HandlerConfig) -> Self {
        Self {
            expected_public_key: config.expected_public_key.clone(),
            max_body_size: config.max_body_size,
            protocol: config.protocol,
            ..Self::default()
        }
    }

    /// Hex public key of the only counterparty allowed to call in.
    pub fn expected_public_key(mut self, public_key: impl Into<String>) -> Self {
        self.expected_public_key = Some(public_key.into());
        self
    }

    /// Replace the default pinned Keccak check.
    pub fn signature_check(mut self, check: Arc<dyn SignatureCheck>) -> Self {
        self.signature_check = Some(check);
        self
    }

    pub fn max_body_size(mut self, max_body_size: usize) -> Self {
        self.max_body_size = max_body_size;
        self
    }

    pub fn protocol(mut self, protocol: ProtocolVersion) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Wrap `rpc` for serving. Key problems surface here, before any
    /// request is accepted.
    pub fn build(self, rpc: RpcRouter) -> Result<axum::Router, ConfigError> {
        if self.max_body_size == 0 {
            return Err(ConfigError::InvalidLimit("max_body_size cannot be 0".into()));
        }

        let check: Arc<dyn SignatureCheck> = match self.signature_check {
            Some(check) => check,
            None => {
                let key = self
                    .expected_public_key
                    .as_deref()
                    .ok_or(ConfigError::MissingPublicKey)?;
                Arc::new(KeccakSignatureCheck::from_hex(key)?)
            }
        };

        let mut config = VerificationConfig::new(check, self.max_body_size, self.protocol);
        if let Some(clock) = self.clock {
            config = config.with_clock(clock);
        }

        info!(
            protocol = %self.protocol,
            max_body_size = self.max_body_size,
            procedures = rpc.procedures().count(),
            "Authenticated RPC handler configured"
        );

        Ok(rpc
            .prepend_interceptor(SignatureErrorInterceptor)
            .with_read_limit(self.max_body_size)
            .into_router()
            .layer(VerificationLayer::new(config)))
    }
}
