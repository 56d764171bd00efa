//! Signing RPC client.

use crate::adapters::http_transport::HttpTransport;
use crate::domain::config::{validate_base_url, ClientConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use crate::domain::error::{ClientError, ConfigError, RpcError, TransportError};
use crate::domain::headers::ProtocolVersion;
use crate::middleware::signing::{SigningLayer, SigningService};
use crate::ports::clock::Clock;
use axum::http::{header::CONTENT_TYPE, Method, Request};
use bytes::Bytes;
use http_body_util::Full;
use serde::{de::DeserializeOwned, Serialize};
use settle_crypto::{DigestSigner, LocalSigner};
use std::sync::Arc;
use std::time::Duration;
use tower::{Layer, ServiceExt};
use tracing::debug;

/// Calls unary procedures on the counterparty, signing every request.
#[derive(Clone)]
pub struct RpcClient {
    base_url: String,
    service: SigningService<HttpTransport>,
}

impl RpcClient {
    pub fn builder() -> RpcClientBuilder {
        RpcClientBuilder::default()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST `request` as JSON to `{base_url}/{procedure}`.
    pub async fn call<Req, Resp>(&self, procedure: &str, request: &Req) -> Result<Resp, ClientError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let body = serde_json::to_vec(request).map_err(ClientError::Encode)?;
        let url = format!("{}/{}", self.base_url, procedure.trim_start_matches('/'));

        let http_request = Request::builder()
            .method(Method::POST)
            .uri(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(body)))
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let response = self.service.clone().oneshot(http_request).await?;
        let status = response.status();
        debug!(%url, %status, "RPC call completed");

        if !status.is_success() {
            return Err(RpcError::from_http_response(status, response.body()).into());
        }
        serde_json::from_slice(response.body()).map_err(ClientError::Decode)
    }
}

/// Builder for [`RpcClient`]; all validation happens in [`build`](Self::build).
pub struct RpcClientBuilder {
    base_url: String,
    private_key: Option<String>,
    signer: Option<Arc<dyn DigestSigner>>,
    clock: Option<Arc<dyn Clock>>,
    timeout: Duration,
    protocol: ProtocolVersion,
}

impl Default for RpcClientBuilder {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            private_key: None,
            signer: None,
            clock: None,
            timeout: DEFAULT_TIMEOUT,
            protocol: ProtocolVersion::default(),
        }
    }
}

impl RpcClientBuilder {
    /// Start from a loaded [`ClientConfig`].
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            private_key: config.private_key.clone(),
            timeout: config.timeout,
            protocol: config.protocol,
            ..Self::default()
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn private_key_hex(mut self, private_key: impl Into<String>) -> Self {
        self.private_key = Some(private_key.into());
        self
    }

    /// Takes precedence over any private key.
    pub fn signer(mut self, signer: Arc<dyn DigestSigner>) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn protocol(mut self, protocol: ProtocolVersion) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn build(self) -> Result<RpcClient, ClientError> {
        let base_url = validate_base_url(&self.base_url)?;

        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout("timeout must be greater than zero".into()).into());
        }

        let signer: Arc<dyn DigestSigner> = match (self.signer, self.private_key.as_deref()) {
            (Some(signer), _) => signer,
            (None, Some(key)) => Arc::new(LocalSigner::from_hex(key).map_err(|source| {
                ConfigError::InvalidKey {
                    name: "private key",
                    source,
                }
            })?),
            (None, None) => return Err(ConfigError::MissingPrivateKey.into()),
        };

        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(ClientError::HttpClient)?;

        let mut layer = SigningLayer::new(signer, self.protocol);
        if let Some(clock) = self.clock {
            layer = layer.with_clock(clock);
        }

        Ok(RpcClient {
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
            service: layer.layer(HttpTransport::new(http)),
        })
    }
}
