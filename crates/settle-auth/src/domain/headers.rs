//! Wire format of the signature headers and the signed message.
//!
//! | Header | Content |
//! |---|---|
//! | `X-Public-Key` | `0x` + hex of the 65-byte uncompressed key |
//! | `X-Signature` | `0x` + hex of the 64/65-byte signature |
//! | `X-Signature-Timestamp` | decimal Unix milliseconds (v2 only) |
//!
//! The signed message is `body` (v1) or `timestamp_le_8 || body` (v2).

use super::error::{HeaderError, TransportError};
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use settle_crypto::{keccak256, Digest, SignedDigest};
use std::fmt;
use std::str::FromStr;

pub const PUBLIC_KEY_HEADER: &str = "X-Public-Key";
pub const SIGNATURE_HEADER: &str = "X-Signature";
pub const TIMESTAMP_HEADER: &str = "X-Signature-Timestamp";

/// Maximum distance between the signed timestamp and the verifier's clock.
pub const TIMESTAMP_TOLERANCE_MS: u64 = 60_000;

/// Default cap on a buffered request body (1 MiB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// Digest construction variant. A deployment picks exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolVersion {
    /// Digest over the body alone.
    #[serde(alias = "V1")]
    V1,
    /// Digest over `timestamp || body`, with a replay window.
    #[default]
    #[serde(alias = "V2")]
    V2,
}

impl ProtocolVersion {
    pub fn uses_timestamp(self) -> bool {
        matches!(self, ProtocolVersion::V2)
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolVersion::V1 => f.write_str("v1"),
            ProtocolVersion::V2 => f.write_str("v2"),
        }
    }
}

impl FromStr for ProtocolVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v1" => Ok(ProtocolVersion::V1),
            "v2" => Ok(ProtocolVersion::V2),
            other => Err(format!("unknown protocol version {:?}", other)),
        }
    }
}

/// Bytes that get hashed and signed.
pub fn signing_message(timestamp: Option<i64>, body: &[u8]) -> Vec<u8> {
    match timestamp {
        Some(ts) => {
            let mut message = Vec::with_capacity(8 + body.len());
            message.extend_from_slice(&ts.to_le_bytes());
            message.extend_from_slice(body);
            message
        }
        None => body.to_vec(),
    }
}

/// Keccak-256 of [`signing_message`].
pub fn signing_digest(timestamp: Option<i64>, body: &[u8]) -> Digest {
    keccak256(&signing_message(timestamp, body))
}

/// Whether `timestamp` lies within the replay window around `now` (inclusive).
pub fn is_fresh(timestamp: i64, now: i64) -> bool {
    timestamp.abs_diff(now) <= TIMESTAMP_TOLERANCE_MS
}

/// Decoded contents of the three signature headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeaders {
    pub public_key: Vec<u8>,
    pub signature: Vec<u8>,
    pub timestamp: Option<i64>,
}

impl SignatureHeaders {
    /// Headers for a freshly signed request.
    pub fn from_signed(signed: &SignedDigest, timestamp: Option<i64>) -> Self {
        Self {
            public_key: signed.public_key.to_vec(),
            signature: signed.signature.as_bytes().to_vec(),
            timestamp,
        }
    }

    /// Parse the headers of an inbound request.
    ///
    /// The timestamp header is read only when `protocol` uses one.
    pub fn parse(headers: &HeaderMap, protocol: ProtocolVersion) -> Result<Self, HeaderError> {
        let public_key = decode_hex_header(headers, PUBLIC_KEY_HEADER)?;
        let signature = decode_hex_header(headers, SIGNATURE_HEADER)?;
        let timestamp = if protocol.uses_timestamp() {
            Some(parse_timestamp(headers)?)
        } else {
            None
        };

        Ok(Self {
            public_key,
            signature,
            timestamp,
        })
    }

    /// Write the headers onto an outbound request, replacing existing values.
    pub fn write(&self, headers: &mut HeaderMap) -> Result<(), TransportError> {
        headers.insert(
            header_name(PUBLIC_KEY_HEADER),
            hex_header_value(&self.public_key, PUBLIC_KEY_HEADER)?,
        );
        headers.insert(
            header_name(SIGNATURE_HEADER),
            hex_header_value(&self.signature, SIGNATURE_HEADER)?,
        );
        match self.timestamp {
            Some(ts) => {
                headers.insert(header_name(TIMESTAMP_HEADER), HeaderValue::from(ts));
            }
            None => {
                headers.remove(header_name(TIMESTAMP_HEADER));
            }
        }
        Ok(())
    }
}

fn header_name(name: &'static str) -> HeaderName {
    match name {
        PUBLIC_KEY_HEADER => HeaderName::from_static("x-public-key"),
        SIGNATURE_HEADER => HeaderName::from_static("x-signature"),
        _ => HeaderName::from_static("x-signature-timestamp"),
    }
}

fn hex_header_value(bytes: &[u8], name: &'static str) -> Result<HeaderValue, TransportError> {
    HeaderValue::from_str(&format!("0x{}", hex::encode(bytes)))
        .map_err(|_| TransportError::HeaderValue(name))
}

fn required_header<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<&'a str, HeaderError> {
    let value = headers.get(name).ok_or(HeaderError::Missing(name))?;
    let value = value
        .to_str()
        .map_err(|_| HeaderError::InvalidEncoding(name))?;
    if value.is_empty() {
        return Err(HeaderError::Missing(name));
    }
    Ok(value)
}

fn decode_hex_header(headers: &HeaderMap, name: &'static str) -> Result<Vec<u8>, HeaderError> {
    let value = required_header(headers, name)?;
    if value.len() < 2 {
        return Err(HeaderError::InvalidEncoding(name));
    }

    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .ok_or(HeaderError::InvalidEncoding(name))?;

    hex::decode(digits).map_err(|_| HeaderError::InvalidEncoding(name))
}

fn parse_timestamp(headers: &HeaderMap) -> Result<i64, HeaderError> {
    required_header(headers, TIMESTAMP_HEADER)?
        .parse::<i64>()
        .map_err(|e| HeaderError::InvalidTimestamp(e.to_string()))
}
