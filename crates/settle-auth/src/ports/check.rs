//! Signature check capability.
//!
//! The middleware hands over raw header bytes and the reconstructed message;
//! the check hashes, verifies and decides whether the signer is trusted.

use crate::domain::error::{CheckError, ConfigError};
use settle_crypto::{keccak256, verify, PublicKey};

/// Decides whether `signature` over `message` by `public_key` is acceptable.
pub trait SignatureCheck: Send + Sync {
    fn check(&self, public_key: &[u8], message: &[u8], signature: &[u8])
        -> Result<(), CheckError>;
}

impl<F> SignatureCheck for F
where
    F: Fn(&[u8], &[u8], &[u8]) -> Result<(), CheckError> + Send + Sync,
{
    fn check(
        &self,
        public_key: &[u8],
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), CheckError> {
        self(public_key, message, signature)
    }
}

/// Keccak-256 + secp256k1 check, optionally pinned to one counterparty.
#[derive(Debug, Clone, Default)]
pub struct KeccakSignatureCheck {
    expected: Option<PublicKey>,
}

impl KeccakSignatureCheck {
    /// Accept only signatures made by `expected`.
    pub fn pinned(expected: PublicKey) -> Self {
        Self {
            expected: Some(expected),
        }
    }

    /// Accept any valid signature.
    pub fn any_signer() -> Self {
        Self { expected: None }
    }

    /// Pin to a hex public key; a malformed key is a startup error.
    pub fn from_hex(expected: &str) -> Result<Self, ConfigError> {
        PublicKey::from_hex(expected)
            .map(Self::pinned)
            .map_err(|source| ConfigError::InvalidKey {
                name: "network public key",
                source,
            })
    }

    pub fn expected(&self) -> Option<&PublicKey> {
        self.expected.as_ref()
    }
}

impl SignatureCheck for KeccakSignatureCheck {
    fn check(
        &self,
        public_key: &[u8],
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), CheckError> {
        if signature.len() < 64 || signature.len() > 65 {
            return Err(CheckError::InvalidSignature);
        }

        let signer = PublicKey::from_bytes(public_key).map_err(|_| CheckError::InvalidPublicKey)?;

        if let Some(expected) = &self.expected {
            if !expected.ct_eq_bytes(public_key) {
                return Err(CheckError::UnknownPublicKey);
            }
        }

        if !verify(&signer, &keccak256(message), &signature[..64]) {
            return Err(CheckError::VerificationFailed);
        }

        Ok(())
    }
}
