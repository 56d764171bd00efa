//! # Signing Capability
//!
//! The client transport never touches a private key directly; it holds a
//! `DigestSigner`. Closures implement the trait, so tests can inject a fake
//! signer that always succeeds or always fails.

use crate::domain::ecdsa::{sign, SignedDigest};
use crate::domain::errors::CryptoError;
use crate::domain::keys::{PrivateKey, PublicKey};

/// Produces a recoverable signature over a 32-byte digest.
pub trait DigestSigner: Send + Sync {
    fn sign_digest(&self, digest: &[u8]) -> Result<SignedDigest, CryptoError>;
}

impl<F> DigestSigner for F
where
    F: Fn(&[u8]) -> Result<SignedDigest, CryptoError> + Send + Sync,
{
    fn sign_digest(&self, digest: &[u8]) -> Result<SignedDigest, CryptoError> {
        self(digest)
    }
}

/// Signs with an in-process private key.
#[derive(Debug, Clone)]
pub struct LocalSigner {
    key: PrivateKey,
}

impl LocalSigner {
    pub fn new(key: PrivateKey) -> Self {
        Self { key }
    }

    /// Parse a hex private key (optional `0x`/`0X` prefix).
    pub fn from_hex(text: &str) -> Result<Self, CryptoError> {
        PrivateKey::from_hex(text).map(Self::new)
    }

    pub fn public_key(&self) -> PublicKey {
        self.key.public_key()
    }
}

impl DigestSigner for LocalSigner {
    fn sign_digest(&self, digest: &[u8]) -> Result<SignedDigest, CryptoError> {
        sign(&self.key, digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::digest::keccak256;
    use crate::domain::ecdsa::verify;

    #[test]
    fn test_local_signer_signs_with_its_key() {
        let signer = LocalSigner::new(PrivateKey::random());
        let digest = keccak256(b"local");

        let signed = signer.sign_digest(&digest).unwrap();
        assert_eq!(signed.public_key, signer.public_key().to_bytes());
        assert!(verify(&signer.public_key(), &digest, signed.signature.as_bytes()));
    }

    #[test]
    fn test_local_signer_from_hex_rejects_garbage() {
        assert!(matches!(
            LocalSigner::from_hex("0x1234"),
            Err(CryptoError::MalformedKey(_))
        ));
    }

    #[test]
    fn test_closure_signer() {
        let failing = |_: &[u8]| -> Result<SignedDigest, CryptoError> {
            Err(CryptoError::SigningFailed("hsm offline".into()))
        };
        let boxed: Box<dyn DigestSigner> = Box::new(failing);

        assert_eq!(
            boxed.sign_digest(&[0u8; 32]),
            Err(CryptoError::SigningFailed("hsm offline".into()))
        );
    }
}
