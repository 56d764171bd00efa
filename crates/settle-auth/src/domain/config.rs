//! Client, handler and server configuration with validation.
//!
//! Every struct deserializes with `#[serde(default)]` and can be overlaid
//! from `SETTLE_*` environment variables.

use super::error::ConfigError;
use super::headers::{ProtocolVersion, DEFAULT_MAX_BODY_SIZE};
use serde::{Deserialize, Serialize};
use settle_crypto::{PrivateKey, PublicKey};
use std::fmt;
use std::net::{Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.t-0.network";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_LISTEN_PORT: u16 = 8080;

/// Outbound client configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL every procedure path is appended to
    pub base_url: String,
    /// Hex private key used to sign requests
    pub private_key: Option<String>,
    /// Whole round-trip timeout
    #[serde(with = "duration_serde")]
    pub timeout: Duration,
    pub protocol: ProtocolVersion,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            private_key: None,
            timeout: DEFAULT_TIMEOUT,
            protocol: ProtocolVersion::default(),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("protocol", &self.protocol)
            .finish()
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Overlay values from `lookup` (an environment stand-in) onto defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(url) = lookup("SETTLE_BASE_URL") {
            config.base_url = url;
        }
        if let Some(key) = lookup("SETTLE_PRIVATE_KEY") {
            config.private_key = Some(key);
        }
        if let Some(timeout) = lookup("SETTLE_TIMEOUT") {
            config.timeout = parse_env_duration("SETTLE_TIMEOUT", &timeout)?;
        }
        if let Some(protocol) = lookup("SETTLE_PROTOCOL") {
            config.protocol = parse_env("SETTLE_PROTOCOL", &protocol)?;
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_base_url(&self.base_url)?;

        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "timeout must be greater than zero".into(),
            ));
        }

        let key = self
            .private_key
            .as_deref()
            .ok_or(ConfigError::MissingPrivateKey)?;
        PrivateKey::from_hex(key).map_err(|source| ConfigError::InvalidKey {
            name: "private key",
            source,
        })?;

        Ok(())
    }
}

/// Inbound handler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HandlerConfig {
    /// Hex public key of the only counterparty allowed to call in
    pub expected_public_key: Option<String>,
    /// Cap on the buffered request body
    pub max_body_size: usize,
    pub protocol: ProtocolVersion,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            expected_public_key: None,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            protocol: ProtocolVersion::default(),
        }
    }
}

impl HandlerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(key) = lookup("SETTLE_NETWORK_PUBLIC_KEY") {
            config.expected_public_key = Some(key);
        }
        if let Some(size) = lookup("SETTLE_MAX_BODY_SIZE") {
            config.max_body_size = parse_env("SETTLE_MAX_BODY_SIZE", &size)?;
        }
        if let Some(protocol) = lookup("SETTLE_PROTOCOL") {
            config.protocol = parse_env("SETTLE_PROTOCOL", &protocol)?;
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_body_size == 0 {
            return Err(ConfigError::InvalidLimit(
                "max_body_size cannot be 0".into(),
            ));
        }

        let key = self
            .expected_public_key
            .as_deref()
            .ok_or(ConfigError::MissingPublicKey)?;
        PublicKey::from_hex(key).map_err(|source| ConfigError::InvalidKey {
            name: "network public key",
            source,
        })?;

        Ok(())
    }
}

/// Listener configuration for the server helper.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    /// Upper bound on graceful shutdown
    #[serde(with = "duration_serde")]
    pub shutdown_timeout: Duration,
    /// Upper bound on reading and answering one request; slower ones get 408
    #[serde(with = "duration_serde")]
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_LISTEN_PORT)),
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(addr) = lookup("SETTLE_LISTEN_ADDR") {
            config.listen_addr = parse_env("SETTLE_LISTEN_ADDR", &addr)?;
        }
        if let Some(timeout) = lookup("SETTLE_SHUTDOWN_TIMEOUT") {
            config.shutdown_timeout = parse_env_duration("SETTLE_SHUTDOWN_TIMEOUT", &timeout)?;
        }
        if let Some(timeout) = lookup("SETTLE_REQUEST_TIMEOUT") {
            config.request_timeout = parse_env_duration("SETTLE_REQUEST_TIMEOUT", &timeout)?;
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shutdown_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "shutdown timeout must be greater than zero".into(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "request timeout must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

pub(crate) fn validate_base_url(base_url: &str) -> Result<reqwest::Url, ConfigError> {
    if base_url.trim().is_empty() {
        return Err(ConfigError::MissingBaseUrl);
    }

    let url = reqwest::Url::parse(base_url)
        .map_err(|e| ConfigError::InvalidBaseUrl(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ConfigError::InvalidBaseUrl(format!(
            "unsupported URL {:?}",
            base_url
        )));
    }
    Ok(url)
}

fn parse_env<T>(name: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidValue {
            name: name.to_string(),
            reason: e.to_string(),
        })
}

fn parse_env_duration(name: &str, value: &str) -> Result<Duration, ConfigError> {
    duration_serde::parse_duration(value).map_err(|reason| ConfigError::InvalidValue {
        name: name.to_string(),
        reason: reason.to_string(),
    })
}

/// Human-readable durations: `"15s"`, `"500ms"`, `"1m"`, or bare seconds.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_millis() == 0 {
            serializer.serialize_str(&format!("{}s", duration.as_secs()))
        } else {
            serializer.serialize_str(&format!("{}ms", duration.as_millis()))
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    pub(super) fn parse_duration(s: &str) -> Result<Duration, &'static str> {
        let s = s.trim();
        // "ms" before "s" and "m"
        if let Some(ms) = s.strip_suffix("ms") {
            ms.trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| "invalid milliseconds")
        } else if let Some(secs) = s.strip_suffix('s') {
            secs.trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid seconds")
        } else if let Some(mins) = s.strip_suffix('m') {
            mins.trim()
                .parse::<u64>()
                .map(|m| Duration::from_secs(m.saturating_mul(60)))
                .map_err(|_| "invalid minutes")
        } else {
            s.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid duration format")
        }
    }
}
