//! Client-side signing middleware.
//!
//! Buffers the outbound body, signs `body` (v1) or `timestamp || body` (v2)
//! and attaches the signature headers. Method, URI and all other headers are
//! left alone. A signing failure aborts the call; nothing is sent unsigned.

use crate::domain::error::TransportError;
use crate::domain::headers::{signing_digest, ProtocolVersion, SignatureHeaders};
use crate::ports::clock::{Clock, SystemClock};
use axum::http::Request;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use settle_crypto::DigestSigner;
use std::sync::Arc;
use tower::{BoxError, Layer, Service};
use tracing::debug;

/// Signing layer
#[derive(Clone)]
pub struct SigningLayer {
    signer: Arc<dyn DigestSigner>,
    clock: Arc<dyn Clock>,
    protocol: ProtocolVersion,
}

impl SigningLayer {
    pub fn new(signer: Arc<dyn DigestSigner>, protocol: ProtocolVersion) -> Self {
        Self {
            signer,
            clock: Arc::new(SystemClock),
            protocol,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

impl<S> Layer<S> for SigningLayer {
    type Service = SigningService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SigningService {
            inner,
            signer: Arc::clone(&self.signer),
            clock: Arc::clone(&self.clock),
            protocol: self.protocol,
        }
    }
}

/// Signing service
#[derive(Clone)]
pub struct SigningService<S> {
    inner: S,
    signer: Arc<dyn DigestSigner>,
    clock: Arc<dyn Clock>,
    protocol: ProtocolVersion,
}

impl<S, B> Service<Request<B>> for SigningService<S>
where
    S: Service<Request<Full<Bytes>>, Error = TransportError> + Clone + Send + 'static,
    S::Future: Send,
    B: http_body::Body<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    type Response = S::Response;
    type Error = TransportError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        let signer = Arc::clone(&self.signer);
        let clock = Arc::clone(&self.clock);
        let protocol = self.protocol;
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let (mut parts, body) = req.into_parts();
            let bytes = body
                .collect()
                .await
                .map_err(|e| TransportError::Body(Into::<BoxError>::into(e).to_string()))?
                .to_bytes();

            let timestamp = protocol.uses_timestamp().then(|| clock.now_millis());
            let signed = signer.sign_digest(&signing_digest(timestamp, &bytes))?;
            SignatureHeaders::from_signed(&signed, timestamp).write(&mut parts.headers)?;

            debug!(
                uri = %parts.uri,
                protocol = %protocol,
                body_len = bytes.len(),
                "Signed outbound request"
            );

            inner.call(Request::from_parts(parts, Full::new(bytes))).await
        })
    }
}
