//! # Crypto Errors
//!
//! Error types for key decoding and signing operations.

use thiserror::Error;

/// Errors that can occur while decoding keys or producing signatures.
///
/// Verification never errors; see [`crate::verify`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CryptoError {
    /// Key material has bad hex, bad length, a bad prefix or is not a valid
    /// curve point / scalar.
    #[error("malformed key: {0}")]
    MalformedKey(String),

    /// The digest handed to the signer is not exactly 32 bytes.
    #[error("digest must be 32 bytes, got {0}")]
    InvalidDigestLength(usize),

    /// The underlying ECDSA implementation refused to sign.
    #[error("signing failed: {0}")]
    SigningFailed(String),

    /// A public key could not be recovered from the signature.
    #[error("failed to recover public key")]
    RecoveryFailed,
}
