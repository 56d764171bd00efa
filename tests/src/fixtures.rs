//! Shared fixtures: a small provider service and helpers to run it.

use serde::{Deserialize, Serialize};
use settle_auth::{
    serve, AuthenticatedHandler, Clock, ConfigError, ProtocolVersion, RpcClient, RpcError,
    RpcRouter, ServerConfig, ServerError, ServerHandle,
};
use settle_crypto::PrivateKey;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

pub const PAY_OUT: &str = "/settlement.v1.ProviderService/PayOut";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayOutRequest {
    pub payment_id: String,
    pub amount: String,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayOutResponse {
    pub payment_id: String,
    pub accepted: bool,
}

pub fn pay_out_request(payment_id: &str, amount: &str) -> PayOutRequest {
    PayOutRequest {
        payment_id: payment_id.to_string(),
        amount: amount.to_string(),
        currency: "EUR".to_string(),
    }
}

async fn pay_out(req: PayOutRequest) -> Result<PayOutResponse, RpcError> {
    let amount: u64 = req
        .amount
        .parse()
        .map_err(|_| RpcError::invalid_argument("amount must be an integer"))?;
    if amount == 0 {
        return Err(RpcError::invalid_argument("amount must be positive"));
    }
    Ok(PayOutResponse {
        payment_id: req.payment_id,
        accepted: true,
    })
}

pub fn provider_rpc() -> RpcRouter {
    RpcRouter::new().unary(PAY_OUT, pay_out)
}

/// Server-side settings for one test provider.
pub struct ProviderOptions {
    pub protocol: ProtocolVersion,
    pub max_body_size: usize,
}

impl Default for ProviderOptions {
    fn default() -> Self {
        Self {
            protocol: ProtocolVersion::V2,
            max_body_size: settle_auth::DEFAULT_MAX_BODY_SIZE,
        }
    }
}

/// A provider that accepts only `network`'s signatures.
pub async fn spawn_provider(
    network: &PrivateKey,
    options: ProviderOptions,
) -> Result<ServerHandle, ServerError> {
    let router = AuthenticatedHandler::builder()
        .expected_public_key(network.public_key().to_hex())
        .protocol(options.protocol)
        .max_body_size(options.max_body_size)
        .build(provider_rpc())
        .map_err(config_to_server_error)?;

    let config = ServerConfig {
        listen_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 0)),
        shutdown_timeout: Duration::from_secs(5),
        ..ServerConfig::default()
    };
    serve(router, &config).await
}

fn config_to_server_error(err: ConfigError) -> ServerError {
    ServerError::Io(std::io::Error::new(std::io::ErrorKind::InvalidInput, err))
}

pub fn client_for(
    handle: &ServerHandle,
    key: &PrivateKey,
    protocol: ProtocolVersion,
    clock: Option<Arc<dyn Clock>>,
) -> RpcClient {
    let mut builder = RpcClient::builder()
        .base_url(format!("http://{}", handle.local_addr()))
        .private_key_hex(key.to_hex())
        .protocol(protocol)
        .timeout(Duration::from_secs(5));
    if let Some(clock) = clock {
        builder = builder.clock(clock);
    }
    match builder.build() {
        Ok(client) => client,
        Err(e) => panic!("test client failed to build: {e}"),
    }
}
