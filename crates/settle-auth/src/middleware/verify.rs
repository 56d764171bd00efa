//! Signature verification middleware.
//!
//! Authenticates every inbound request against its signature headers and
//! records a [`VerificationOutcome`] in the request extensions. It never
//! answers a request itself: the RPC interceptor turns a failed outcome into
//! a typed error, so the inner service is always called.
//!
//! Steps, in order: parse headers, parse timestamp (v2), freshness check
//! (v2), bounded body read, digest and verify.

use crate::domain::error::{HeaderError, VerificationError};
use crate::domain::headers::{is_fresh, signing_message, ProtocolVersion, SignatureHeaders};
use crate::domain::outcome::{self, VerificationOutcome};
use crate::ports::check::SignatureCheck;
use crate::ports::clock::{Clock, SystemClock};
use axum::{
    body::Body,
    http::{header::CONTENT_LENGTH, HeaderMap, Request},
    response::Response,
};
use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use std::sync::Arc;
use tower::{Layer, Service};
use tracing::{debug, warn};

/// Verification settings shared by every request.
#[derive(Clone)]
pub struct VerificationConfig {
    pub check: Arc<dyn SignatureCheck>,
    pub clock: Arc<dyn Clock>,
    pub max_body_size: usize,
    pub protocol: ProtocolVersion,
}

impl VerificationConfig {
    pub fn new(check: Arc<dyn SignatureCheck>, max_body_size: usize, protocol: ProtocolVersion) -> Self {
        Self {
            check,
            clock: Arc::new(SystemClock),
            max_body_size,
            protocol,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

/// Verification layer
#[derive(Clone)]
pub struct VerificationLayer {
    config: Arc<VerificationConfig>,
}

impl VerificationLayer {
    pub fn new(config: VerificationConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

impl<S> Layer<S> for VerificationLayer {
    type Service = VerificationService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        VerificationService {
            inner,
            config: Arc::clone(&self.config),
        }
    }
}

/// Verification service
#[derive(Clone)]
pub struct VerificationService<S> {
    inner: S,
    config: Arc<VerificationConfig>,
}

impl<S> Service<Request<Body>> for VerificationService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let config = Arc::clone(&self.config);
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let (mut parts, body) = req.into_parts();
            let (result, body) = authenticate(&config, &parts.headers, body).await;

            let outcome = match result {
                Ok(()) => {
                    debug!(
                        path = %parts.uri.path(),
                        protocol = %config.protocol,
                        "Request signature verified"
                    );
                    VerificationOutcome::Verified
                }
                Err(e) => {
                    warn!(
                        path = %parts.uri.path(),
                        code = %e.code(),
                        reason = %e,
                        "Request signature rejected"
                    );
                    VerificationOutcome::Failed(e.into())
                }
            };

            outcome::attach(&mut parts.extensions, outcome);
            inner.call(Request::from_parts(parts, body)).await
        })
    }
}

/// Run every check and hand back the body for downstream handlers.
///
/// A body that was fully read is returned as a fresh `Body` over the same
/// bytes; one that was never touched is returned as is.
async fn authenticate(
    config: &VerificationConfig,
    headers: &HeaderMap,
    body: Body,
) -> (Result<(), VerificationError>, Body) {
    let signature_headers = match SignatureHeaders::parse(headers, config.protocol) {
        Ok(parsed) => parsed,
        Err(e) => return (Err(e.into()), body),
    };

    if let Some(timestamp) = signature_headers.timestamp {
        if !is_fresh(timestamp, config.clock.now_millis()) {
            return (Err(HeaderError::TimestampOutsideWindow.into()), body);
        }
    }

    let bytes = match read_body_with_cap(headers, body, config.max_body_size).await {
        Ok(bytes) => bytes,
        Err(e) => return (Err(e), Body::empty()),
    };

    let message = signing_message(signature_headers.timestamp, &bytes);
    let result = config
        .check
        .check(
            &signature_headers.public_key,
            &message,
            &signature_headers.signature,
        )
        .map_err(VerificationError::from);

    (result, Body::from(bytes))
}

/// Read at most `cap` bytes.
///
/// `Content-Length` is untrusted and only used to reject early; the cap is
/// enforced on the bytes actually received.
async fn read_body_with_cap(
    headers: &HeaderMap,
    body: Body,
    cap: usize,
) -> Result<Bytes, VerificationError> {
    let declared = headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok());
    if matches!(declared, Some(len) if len > cap as u64) {
        return Err(VerificationError::PayloadTooLarge(cap));
    }

    match Limited::new(body, cap).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            Err(VerificationError::PayloadTooLarge(cap))
        }
        Err(e) => Err(VerificationError::BodyRead(e.to_string())),
    }
}
