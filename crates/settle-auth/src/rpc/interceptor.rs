//! Turns the recorded verification outcome into an RPC error.

use super::{Interceptor, Next, RpcRequest};
use crate::domain::error::RpcError;
use crate::domain::outcome::{self, VerificationOutcome};
use async_trait::async_trait;
use bytes::Bytes;
use tracing::error;

/// Must run first in the chain, inside the verification layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignatureErrorInterceptor;

#[async_trait]
impl Interceptor for SignatureErrorInterceptor {
    async fn intercept(&self, mut request: RpcRequest, next: Next<'_>) -> Result<Bytes, RpcError> {
        match outcome::take(&mut request.extensions) {
            Some(VerificationOutcome::Verified) => next.run(request).await,
            Some(VerificationOutcome::Failed(err)) => Err(err),
            None => {
                error!(
                    procedure = %request.procedure,
                    "No signature result in request context; verification layer is not installed"
                );
                Err(RpcError::internal("no signature result in context"))
            }
        }
    }
}
