//! # Key Codec
//!
//! Conversions between hex text, raw bytes and secp256k1 keys.
//!
//! The canonical public key form is the 65-byte uncompressed SEC1 encoding
//! `0x04 || X || Y`. Compressed (33-byte) keys are rejected so the wire format
//! stays fixed-width. All formatting emits zero-padded, `0x`-prefixed hex.

use super::errors::CryptoError;
use k256::ecdsa::{SigningKey, VerifyingKey};
use std::fmt;
use std::str::FromStr;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

/// Length of a serialized private key scalar.
pub const PRIVATE_KEY_LENGTH: usize = 32;

/// Length of an uncompressed public key (`0x04 || X || Y`).
pub const PUBLIC_KEY_LENGTH: usize = 65;

const UNCOMPRESSED_TAG: u8 = 0x04;

/// A secp256k1 private key.
///
/// Never transmitted. The inner scalar is zeroized on drop.
#[derive(Clone)]
pub struct PrivateKey(SigningKey);

impl PrivateKey {
    /// Parse a 32-byte hex private key, with or without a `0x`/`0X` prefix.
    pub fn from_hex(text: &str) -> Result<Self, CryptoError> {
        let bytes = decode_hex(text)?;
        Self::from_bytes(&bytes)
    }

    /// Build a private key from exactly 32 big-endian bytes.
    ///
    /// Zero and values at or above the curve order are rejected.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != PRIVATE_KEY_LENGTH {
            return Err(CryptoError::MalformedKey(format!(
                "private key must be {} bytes, got {}",
                PRIVATE_KEY_LENGTH,
                bytes.len()
            )));
        }

        SigningKey::from_slice(bytes)
            .map(Self)
            .map_err(|_| CryptoError::MalformedKey("private key is not a valid scalar".into()))
    }

    /// Generate a fresh random private key.
    pub fn random() -> Self {
        Self(SigningKey::random(&mut rand::thread_rng()))
    }

    /// Zero-padded 32-byte scalar.
    pub fn to_bytes(&self) -> Zeroizing<[u8; PRIVATE_KEY_LENGTH]> {
        let mut out = Zeroizing::new([0u8; PRIVATE_KEY_LENGTH]);
        out.copy_from_slice(&self.0.to_bytes());
        out
    }

    /// `0x`-prefixed lowercase hex of the 32-byte scalar.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes().as_slice()))
    }

    /// Public key belonging to this private key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(*self.0.verifying_key())
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.0
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes().ct_eq(&*other.to_bytes()).into()
    }
}

impl Eq for PrivateKey {}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("public_key", &self.public_key().to_hex())
            .finish_non_exhaustive()
    }
}

impl FromStr for PrivateKey {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

/// A secp256k1 public key.
///
/// Two keys are equal iff their X and Y coordinates are equal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PublicKey(VerifyingKey);

impl PublicKey {
    /// Parse a hex-encoded uncompressed public key, with or without `0x`.
    pub fn from_hex(text: &str) -> Result<Self, CryptoError> {
        let bytes = decode_hex(text)?;
        Self::from_bytes(&bytes)
    }

    /// Parse the 65-byte `0x04 || X || Y` form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != PUBLIC_KEY_LENGTH {
            return Err(CryptoError::MalformedKey(format!(
                "public key must be {} bytes, got {}",
                PUBLIC_KEY_LENGTH,
                bytes.len()
            )));
        }
        if bytes[0] != UNCOMPRESSED_TAG {
            return Err(CryptoError::MalformedKey(
                "public key must be uncompressed (0x04 prefix)".into(),
            ));
        }

        VerifyingKey::from_sec1_bytes(bytes)
            .map(Self)
            .map_err(|_| CryptoError::MalformedKey("public key is not on the curve".into()))
    }

    /// Canonical 65-byte uncompressed encoding with zero-padded coordinates.
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_LENGTH] {
        let encoded = self.0.to_encoded_point(false);
        let mut out = [0u8; PUBLIC_KEY_LENGTH];
        out.copy_from_slice(encoded.as_bytes());
        out
    }

    /// `0x`-prefixed lowercase hex of the 65-byte encoding.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }

    /// Constant-time comparison against raw 65-byte key material.
    pub fn ct_eq_bytes(&self, other: &[u8]) -> bool {
        let ours = self.to_bytes();
        if other.len() != ours.len() {
            return false;
        }
        ours.as_slice().ct_eq(other).into()
    }

    pub(crate) fn verifying_key(&self) -> &VerifyingKey {
        &self.0
    }

    pub(crate) fn from_verifying_key(key: VerifyingKey) -> Self {
        Self(key)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for PublicKey {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

/// Strip an optional `0x`/`0X` prefix and decode the rest as hex.
fn decode_hex(text: &str) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let trimmed = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);

    hex::decode(trimmed)
        .map(Zeroizing::new)
        .map_err(|e| CryptoError::MalformedKey(format!("invalid hex: {}", e)))
}
