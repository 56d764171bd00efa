//! Outbound HTTP transport backed by reqwest.

use crate::domain::error::TransportError;
use axum::http::{Request, Response};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use std::task::{Context, Poll};
use tower::Service;

/// Sends a fully buffered request and buffers the response.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Service<Request<Full<Bytes>>> for HttpTransport {
    type Response = Response<Bytes>;
    type Error = TransportError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Full<Bytes>>) -> Self::Future {
        let client = self.client.clone();

        Box::pin(async move {
            let (parts, body) = req.into_parts();
            let bytes = match body.collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(never) => match never {},
            };

            let request = reqwest::Request::try_from(Request::from_parts(parts, bytes))
                .map_err(|e| TransportError::Request(e.to_string()))?;
            let response = client.execute(request).await?;

            let mut builder = Response::builder().status(response.status());
            if let Some(headers) = builder.headers_mut() {
                headers.extend(
                    response
                        .headers()
                        .iter()
                        .map(|(name, value)| (name.clone(), value.clone())),
                );
            }
            let body = response.bytes().await?;

            builder
                .body(body)
                .map_err(|e| TransportError::Request(e.to_string()))
        })
    }
}
