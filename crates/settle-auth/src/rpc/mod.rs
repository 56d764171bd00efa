//! Unary JSON RPC dispatch.
//!
//! Procedures are mounted as `POST /package.Service/Method`. Every call runs
//! through the interceptor chain on raw bytes first; the typed handler only
//! sees its decoded message once every interceptor has passed it on. A body
//! that cannot be read is reported by the endpoint, so interceptors still
//! get the first word.

pub mod interceptor;

use crate::domain::error::{Code, RpcError};
use crate::domain::headers::DEFAULT_MAX_BODY_SIZE;
use async_trait::async_trait;
use axum::{
    body::Body,
    extract::Request,
    http::{header::CONTENT_TYPE, Extensions, HeaderMap},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use bytes::Bytes;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

pub use interceptor::SignatureErrorInterceptor;

/// A call as interceptors see it: before message decoding.
#[derive(Debug)]
pub struct RpcRequest {
    /// Route path, e.g. `/settlement.v1.ProviderService/PayOut`
    pub procedure: String,
    pub headers: HeaderMap,
    pub extensions: Extensions,
    pub body: Bytes,
}

/// Wraps every procedure call. Returns the encoded response message.
#[async_trait]
pub trait Interceptor: Send + Sync + 'static {
    async fn intercept(&self, request: RpcRequest, next: Next<'_>) -> Result<Bytes, RpcError>;
}

/// The rest of the chain after the current interceptor.
pub struct Next<'a> {
    chain: &'a [Arc<dyn Interceptor>],
    endpoint: &'a dyn Endpoint,
}

impl<'a> Next<'a> {
    pub async fn run(self, request: RpcRequest) -> Result<Bytes, RpcError> {
        match self.chain.split_first() {
            Some((first, rest)) => {
                first
                    .intercept(
                        request,
                        Next {
                            chain: rest,
                            endpoint: self.endpoint,
                        },
                    )
                    .await
            }
            None => self.endpoint.call(request).await,
        }
    }
}

#[async_trait]
trait Endpoint: Send + Sync {
    async fn call(&self, request: RpcRequest) -> Result<Bytes, RpcError>;
}

struct UnaryEndpoint<F, Req, Resp> {
    handler: F,
    _marker: PhantomData<fn(Req) -> Resp>,
}

#[async_trait]
impl<F, Fut, Req, Resp> Endpoint for UnaryEndpoint<F, Req, Resp>
where
    F: Fn(Req) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Resp, RpcError>> + Send,
    Req: DeserializeOwned + Send + 'static,
    Resp: Serialize + Send + 'static,
{
    async fn call(&self, request: RpcRequest) -> Result<Bytes, RpcError> {
        let message: Req = serde_json::from_slice(&request.body)
            .map_err(|e| RpcError::invalid_argument(format!("invalid request message: {e}")))?;

        let response = (self.handler)(message).await?;

        serde_json::to_vec(&response)
            .map(Bytes::from)
            .map_err(|e| RpcError::internal(format!("failed to encode response message: {e}")))
    }
}

/// Stands in for the procedure when the request body could not be read.
struct UnreadableBody(RpcError);

#[async_trait]
impl Endpoint for UnreadableBody {
    async fn call(&self, _request: RpcRequest) -> Result<Bytes, RpcError> {
        Err(self.0.clone())
    }
}

/// Registry of unary procedures plus the interceptor chain around them.
pub struct RpcRouter {
    routes: HashMap<String, Arc<dyn Endpoint>>,
    interceptors: Vec<Arc<dyn Interceptor>>,
    read_limit: usize,
}

impl Default for RpcRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl RpcRouter {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
            interceptors: Vec::new(),
            read_limit: DEFAULT_MAX_BODY_SIZE,
        }
    }

    /// Register a JSON unary procedure. A missing leading `/` is added.
    pub fn unary<F, Fut, Req, Resp>(mut self, procedure: &str, handler: F) -> Self
    where
        F: Fn(Req) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Resp, RpcError>> + Send,
        Req: DeserializeOwned + Send + 'static,
        Resp: Serialize + Send + 'static,
    {
        let endpoint = UnaryEndpoint {
            handler,
            _marker: PhantomData,
        };
        self.routes
            .insert(procedure_path(procedure), Arc::new(endpoint));
        self
    }

    /// Append an interceptor; earlier ones run first.
    pub fn interceptor(mut self, interceptor: impl Interceptor) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    pub(crate) fn prepend_interceptor(mut self, interceptor: impl Interceptor) -> Self {
        self.interceptors.insert(0, Arc::new(interceptor));
        self
    }

    /// Cap on the request body read by the router itself.
    pub fn with_read_limit(mut self, limit: usize) -> Self {
        self.read_limit = limit;
        self
    }

    pub fn procedures(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }

    pub fn into_router(self) -> Router {
        let interceptors: Arc<[Arc<dyn Interceptor>]> = self.interceptors.into();
        let read_limit = self.read_limit;

        let mut router = Router::new();
        for (procedure, endpoint) in self.routes {
            let interceptors = Arc::clone(&interceptors);
            let path = procedure.clone();
            router = router.route(
                &path,
                post(move |req: Request| {
                    let procedure = procedure.clone();
                    let endpoint = Arc::clone(&endpoint);
                    let interceptors = Arc::clone(&interceptors);
                    async move { dispatch(procedure, endpoint, interceptors, read_limit, req).await }
                })
                .fallback(|req: Request| async move {
                    debug!(method = %req.method(), path = %req.uri().path(), "Method not allowed");
                    RpcError::new(
                        Code::Unimplemented,
                        format!("method {} not allowed, procedures are called with POST", req.method()),
                    )
                }),
            );
        }

        router.fallback(|req: Request| async move {
            debug!(path = %req.uri().path(), "Unknown procedure");
            RpcError::not_found(format!("procedure {} not found", req.uri().path()))
        })
    }
}

async fn dispatch(
    procedure: String,
    endpoint: Arc<dyn Endpoint>,
    interceptors: Arc<[Arc<dyn Interceptor>]>,
    read_limit: usize,
    req: Request<Body>,
) -> Response {
    let (parts, body) = req.into_parts();
    let (body, unreadable) = match axum::body::to_bytes(body, read_limit).await {
        Ok(body) => (body, None),
        Err(e) => {
            debug!(%procedure, error = %e, "Request body unreadable");
            let err = RpcError::invalid_argument(format!("failed to read request body: {e}"));
            (Bytes::new(), Some(UnreadableBody(err)))
        }
    };

    let request = RpcRequest {
        procedure,
        headers: parts.headers,
        extensions: parts.extensions,
        body,
    };
    let endpoint: &dyn Endpoint = match &unreadable {
        Some(unreadable) => unreadable,
        None => endpoint.as_ref(),
    };
    let next = Next {
        chain: &interceptors,
        endpoint,
    };

    match next.run(request).await {
        Ok(message) => ([(CONTENT_TYPE, "application/json")], message).into_response(),
        Err(e) => e.into_response(),
    }
}

fn procedure_path(procedure: &str) -> String {
    if procedure.starts_with('/') {
        procedure.to_string()
    } else {
        format!("/{procedure}")
    }
}
