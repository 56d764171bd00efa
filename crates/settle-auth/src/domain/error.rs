//! Error types with Connect status codes.
//!
//! Per-request failures become an [`RpcError`]; startup failures are
//! [`ConfigError`] and must stop the process before it serves anything.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use settle_crypto::CryptoError;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Connect/gRPC status vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Code {
    Canceled,
    Unknown,
    InvalidArgument,
    DeadlineExceeded,
    NotFound,
    AlreadyExists,
    PermissionDenied,
    ResourceExhausted,
    FailedPrecondition,
    Aborted,
    OutOfRange,
    Unimplemented,
    Internal,
    Unavailable,
    DataLoss,
    Unauthenticated,
}

impl Code {
    pub fn as_str(&self) -> &'static str {
        match self {
            Code::Canceled => "canceled",
            Code::Unknown => "unknown",
            Code::InvalidArgument => "invalid_argument",
            Code::DeadlineExceeded => "deadline_exceeded",
            Code::NotFound => "not_found",
            Code::AlreadyExists => "already_exists",
            Code::PermissionDenied => "permission_denied",
            Code::ResourceExhausted => "resource_exhausted",
            Code::FailedPrecondition => "failed_precondition",
            Code::Aborted => "aborted",
            Code::OutOfRange => "out_of_range",
            Code::Unimplemented => "unimplemented",
            Code::Internal => "internal",
            Code::Unavailable => "unavailable",
            Code::DataLoss => "data_loss",
            Code::Unauthenticated => "unauthenticated",
        }
    }

    /// HTTP status used when the error is written as a unary response.
    pub fn http_status(&self) -> StatusCode {
        match self {
            // 499 Client Closed Request has no named constant
            Code::Canceled => StatusCode::from_u16(499).unwrap_or(StatusCode::BAD_REQUEST),
            Code::Unknown | Code::Internal | Code::DataLoss => StatusCode::INTERNAL_SERVER_ERROR,
            Code::InvalidArgument | Code::FailedPrecondition | Code::OutOfRange => {
                StatusCode::BAD_REQUEST
            }
            Code::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
            Code::NotFound => StatusCode::NOT_FOUND,
            Code::AlreadyExists | Code::Aborted => StatusCode::CONFLICT,
            Code::PermissionDenied => StatusCode::FORBIDDEN,
            Code::ResourceExhausted => StatusCode::TOO_MANY_REQUESTS,
            Code::Unimplemented => StatusCode::NOT_IMPLEMENTED,
            Code::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            Code::Unauthenticated => StatusCode::UNAUTHORIZED,
        }
    }

    /// Best-effort code for an error response whose body carried none.
    pub fn from_http_status(status: StatusCode) -> Self {
        match status.as_u16() {
            400 => Code::Internal,
            401 => Code::Unauthenticated,
            403 => Code::PermissionDenied,
            404 => Code::Unimplemented,
            429 | 502 | 503 | 504 => Code::Unavailable,
            _ => Code::Unknown,
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed RPC failure, serialized as `{"code": "...", "message": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct RpcError {
    pub code: Code,
    #[serde(default)]
    pub message: String,
}

impl RpcError {
    pub fn new(code: Code, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(Code::InvalidArgument, message)
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(Code::Unauthenticated, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(Code::Internal, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(Code::NotFound, message)
    }

    /// Decode an error response body, falling back to the status line.
    pub fn from_http_response(status: StatusCode, body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_else(|_| {
            Self::new(
                Code::from_http_status(status),
                String::from_utf8_lossy(body).into_owned(),
            )
        })
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        (self.code.http_status(), axum::Json(self)).into_response()
    }
}

/// Reasons a signature check rejects a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CheckError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("invalid public key")]
    InvalidPublicKey,
    #[error("request signed with unknown public key")]
    UnknownPublicKey,
    #[error("signature verification failed")]
    VerificationFailed,
}

/// Problems with the signature headers themselves.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    #[error("missing required header: {0}")]
    Missing(&'static str),
    #[error("invalid header encoding: {0}")]
    InvalidEncoding(&'static str),
    #[error("invalid timestamp header: {0}")]
    InvalidTimestamp(String),
    #[error("timestamp is outside the allowed time window")]
    TimestampOutsideWindow,
}

/// Every way the verification middleware can fail a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    #[error(transparent)]
    Header(#[from] HeaderError),
    #[error("max payload size of {0} bytes exceeded")]
    PayloadTooLarge(usize),
    #[error("failed to read request body: {0}")]
    BodyRead(String),
    #[error(transparent)]
    Check(#[from] CheckError),
}

impl VerificationError {
    pub fn code(&self) -> Code {
        match self {
            VerificationError::Header(_)
            | VerificationError::PayloadTooLarge(_)
            | VerificationError::BodyRead(_) => Code::InvalidArgument,
            VerificationError::Check(_) => Code::Unauthenticated,
        }
    }
}

impl From<VerificationError> for RpcError {
    fn from(err: VerificationError) -> Self {
        RpcError::new(err.code(), err.to_string())
    }
}

/// Failures of a signed round trip on the client side.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to read request body: {0}")]
    Body(String),
    #[error("failed to sign request: {0}")]
    Signing(#[from] CryptoError),
    #[error("invalid value for header {0}")]
    HeaderValue(&'static str),
    #[error("invalid request: {0}")]
    Request(String),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Configuration errors; fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("base URL is not set")]
    MissingBaseUrl,
    #[error("base URL is not valid: {0}")]
    InvalidBaseUrl(String),
    #[error("private key is not set")]
    MissingPrivateKey,
    #[error("network public key is not set")]
    MissingPublicKey,
    #[error("invalid {name}: {source}")]
    InvalidKey {
        name: &'static str,
        #[source]
        source: CryptoError,
    },
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
    #[error("invalid limit: {0}")]
    InvalidLimit(String),
    #[error("invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}

/// Errors returned by [`crate::RpcClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to build http client: {0}")]
    HttpClient(#[source] reqwest::Error),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("failed to encode request: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to decode response: {0}")]
    Decode(#[source] serde_json::Error),
    #[error(transparent)]
    Rpc(#[from] RpcError),
}

impl ClientError {
    /// The RPC code, if the server answered with an error.
    pub fn code(&self) -> Option<Code> {
        match self {
            ClientError::Rpc(err) => Some(err.code),
            _ => None,
        }
    }
}

/// Server lifecycle errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
    #[error("server task failed: {0}")]
    Join(String),
    #[error("graceful shutdown did not finish within {0:?}")]
    ShutdownTimeout(Duration),
}
