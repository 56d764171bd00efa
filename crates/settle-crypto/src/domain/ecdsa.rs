//! # ECDSA Signing and Verification (secp256k1)
//!
//! ## Signature Format
//!
//! `R(32) || S(32) || V(1)` where `V` is the raw recovery id in {0, 1}. The
//! 27/28 offset of Bitcoin compact signatures is never produced or accepted.
//!
//! ## Security Notes
//!
//! - Signing always emits low-S (the recovery id is flipped along with S)
//! - Verification accepts both low-S and high-S; S is normalized before the
//!   curve check because k256 rejects high-S outright
//! - Verification only looks at `R || S`; the recovery byte is ignored

use super::digest::DIGEST_LENGTH;
use super::errors::CryptoError;
use super::keys::{PrivateKey, PublicKey, PUBLIC_KEY_LENGTH};
use k256::ecdsa::signature::hazmat::PrehashVerifier;
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use std::fmt;

/// Length of a recoverable signature (`R || S || V`).
pub const SIGNATURE_LENGTH: usize = 65;

/// Length of the plain `R || S` prefix used for verification.
const RS_LENGTH: usize = 64;

/// A 65-byte recoverable signature.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RecoverableSignature([u8; SIGNATURE_LENGTH]);

impl RecoverableSignature {
    /// Wrap exactly 65 bytes. Contents are not validated.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let array: [u8; SIGNATURE_LENGTH] = bytes.try_into().ok()?;
        Some(Self(array))
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.0
    }

    pub fn r(&self) -> &[u8] {
        &self.0[..32]
    }

    pub fn s(&self) -> &[u8] {
        &self.0[32..RS_LENGTH]
    }

    pub fn recovery_id(&self) -> u8 {
        self.0[RS_LENGTH]
    }

    /// `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for RecoverableSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RecoverableSignature")
            .field(&self.to_hex())
            .finish()
    }
}

impl AsRef<[u8]> for RecoverableSignature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Output of a signing operation: the signature and the signer's public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignedDigest {
    pub signature: RecoverableSignature,
    pub public_key: [u8; PUBLIC_KEY_LENGTH],
}

/// Sign a 32-byte digest.
///
/// # Errors
/// * `CryptoError::InvalidDigestLength` - digest is not 32 bytes
/// * `CryptoError::SigningFailed` - k256 refused the prehash
pub fn sign(private_key: &PrivateKey, digest: &[u8]) -> Result<SignedDigest, CryptoError> {
    if digest.len() != DIGEST_LENGTH {
        return Err(CryptoError::InvalidDigestLength(digest.len()));
    }

    let (signature, recovery_id) = private_key
        .signing_key()
        .sign_prehash_recoverable(digest)
        .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;

    let (signature, recovery_id) = match signature.normalize_s() {
        Some(low) => (
            low,
            RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced()),
        ),
        None => (signature, recovery_id),
    };

    let mut out = [0u8; SIGNATURE_LENGTH];
    out[..RS_LENGTH].copy_from_slice(&signature.to_bytes());
    out[RS_LENGTH] = recovery_id.to_byte();

    Ok(SignedDigest {
        signature: RecoverableSignature(out),
        public_key: private_key.public_key().to_bytes(),
    })
}

/// Check a 64- or 65-byte signature over a 32-byte digest.
///
/// Returns `false` (never errors) for a wrong digest length, a wrong signature
/// length, zero R or S, or a signature that does not verify.
pub fn verify(public_key: &PublicKey, digest: &[u8], signature: &[u8]) -> bool {
    if digest.len() != DIGEST_LENGTH {
        return false;
    }
    if signature.len() != RS_LENGTH && signature.len() != SIGNATURE_LENGTH {
        return false;
    }

    // from_slice rejects zero and out-of-range scalars
    let Ok(parsed) = Signature::from_slice(&signature[..RS_LENGTH]) else {
        return false;
    };
    let parsed = parsed.normalize_s().unwrap_or(parsed);

    public_key
        .verifying_key()
        .verify_prehash(digest, &parsed)
        .is_ok()
}

/// Recover the signer's public key from a digest and a 65-byte signature.
pub fn recover_public_key(digest: &[u8], signature: &[u8]) -> Result<PublicKey, CryptoError> {
    if digest.len() != DIGEST_LENGTH {
        return Err(CryptoError::InvalidDigestLength(digest.len()));
    }
    if signature.len() != SIGNATURE_LENGTH {
        return Err(CryptoError::RecoveryFailed);
    }

    let recovery_id =
        RecoveryId::from_byte(signature[RS_LENGTH]).ok_or(CryptoError::RecoveryFailed)?;
    let parsed =
        Signature::from_slice(&signature[..RS_LENGTH]).map_err(|_| CryptoError::RecoveryFailed)?;

    VerifyingKey::recover_from_prehash(digest, &parsed, recovery_id)
        .map(PublicKey::from_verifying_key)
        .map_err(|_| CryptoError::RecoveryFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::digest::keccak256;

    const PRIVATE_KEY_HEX: &str =
        "6b30303de7b26bfb1222b317a52113357f8bb06de00160b4261a2fef9c8b9bd8";
    const PUBLIC_KEY_HEX: &str = "0x044fa1465c087aaf42e5ff707050b8f77d2ce92129c5f300686bdd3adfffe44567713bb7931632837c5268a832512e75599b6964f4484c9531c02e96d90384d9f0";

    #[test]
    fn test_sign_and_verify_known_key() {
        let key = PrivateKey::from_hex(PRIVATE_KEY_HEX).unwrap();
        let digest = keccak256(b"please sign me!");

        let signed = sign(&key, &digest).unwrap();
        let public_key = PublicKey::from_bytes(&signed.public_key).unwrap();

        assert_eq!(public_key.to_hex(), PUBLIC_KEY_HEX);
        assert_eq!(signed.signature.as_bytes().len(), SIGNATURE_LENGTH);
        assert!(verify(&public_key, &digest, &signed.signature.as_bytes()[..64]));
        assert!(verify(&public_key, &digest, signed.signature.as_bytes()));

        let unrelated = PrivateKey::random().public_key();
        assert!(!verify(&unrelated, &digest, &signed.signature.as_bytes()[..64]));
    }

    #[test]
    fn test_sign_rejects_wrong_digest_length() {
        let key = PrivateKey::random();
        assert_eq!(
            sign(&key, b"short"),
            Err(CryptoError::InvalidDigestLength(5))
        );
        assert_eq!(
            sign(&key, &[0u8; 33]),
            Err(CryptoError::InvalidDigestLength(33))
        );
    }

    #[test]
    fn test_sign_produces_low_s_and_raw_recovery_id() {
        let key = PrivateKey::random();
        for i in 0..32u8 {
            let digest = keccak256(&[i]);
            let signed = sign(&key, &digest).unwrap();
            let parsed = Signature::from_slice(&signed.signature.as_bytes()[..64]).unwrap();

            assert!(parsed.normalize_s().is_none());
            assert!(signed.signature.recovery_id() <= 1);
        }
    }

    #[test]
    fn test_verify_accepts_high_s() {
        let key = PrivateKey::random();
        let digest = keccak256(b"malleable");
        let signed = sign(&key, &digest).unwrap();

        let low = Signature::from_slice(&signed.signature.as_bytes()[..64]).unwrap();
        let (r, s) = low.split_scalars();
        let high = Signature::from_scalars(r, (-*s).to_bytes()).unwrap();
        assert!(high.normalize_s().is_some());

        assert!(verify(&key.public_key(), &digest, &high.to_bytes()));
    }

    #[test]
    fn test_verify_rejects_malformed_inputs() {
        let key = PrivateKey::random();
        let digest = keccak256(b"payload");
        let signed = sign(&key, &digest).unwrap();
        let sig = signed.signature.as_bytes();
        let pk = key.public_key();

        // digest length
        assert!(!verify(&pk, &digest[..31], sig));
        // signature length
        assert!(!verify(&pk, &digest, &sig[..63]));
        assert!(!verify(&pk, &digest, &[sig.as_slice(), &[0u8][..]].concat()));

        // zero R
        let mut zero_r = *sig;
        zero_r[..32].fill(0);
        assert!(!verify(&pk, &digest, &zero_r));

        // zero S
        let mut zero_s = *sig;
        zero_s[32..64].fill(0);
        assert!(!verify(&pk, &digest, &zero_s));
    }

    #[test]
    fn test_verify_ignores_recovery_byte() {
        let key = PrivateKey::random();
        let digest = keccak256(b"recovery byte is not checked");
        let signed = sign(&key, &digest).unwrap();

        let mut altered = *signed.signature.as_bytes();
        altered[64] = 0xAB;
        assert!(verify(&key.public_key(), &digest, &altered));
    }

    #[test]
    fn test_recover_public_key() {
        let key = PrivateKey::from_hex(PRIVATE_KEY_HEX).unwrap();
        let digest = keccak256(b"please sign me!");
        let signed = sign(&key, &digest).unwrap();

        let recovered = recover_public_key(&digest, signed.signature.as_bytes()).unwrap();
        assert_eq!(recovered, key.public_key());
    }

    #[test]
    fn test_recover_rejects_offset_recovery_id() {
        let key = PrivateKey::random();
        let digest = keccak256(b"eth style only");
        let signed = sign(&key, &digest).unwrap();

        let mut offset = *signed.signature.as_bytes();
        offset[64] += 27;
        assert_eq!(
            recover_public_key(&digest, &offset),
            Err(CryptoError::RecoveryFailed)
        );
        assert_eq!(
            recover_public_key(&digest, &offset[..64]),
            Err(CryptoError::RecoveryFailed)
        );
    }

    #[test]
    fn test_recoverable_signature_accessors() {
        let key = PrivateKey::random();
        let signed = sign(&key, &keccak256(b"parts")).unwrap();
        let sig = signed.signature;

        assert_eq!(sig.r().len(), 32);
        assert_eq!(sig.s().len(), 32);
        assert_eq!(sig.to_hex().len(), 2 + SIGNATURE_LENGTH * 2);
        assert_eq!(RecoverableSignature::from_bytes(sig.as_bytes()), Some(sig));
        assert_eq!(RecoverableSignature::from_bytes(&sig.as_bytes()[..64]), None);
    }
}
