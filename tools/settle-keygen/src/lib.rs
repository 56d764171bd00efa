//! Key pair generation for request signing.
//!
//! Keys come from a BIP-39 mnemonic derived along [`DERIVATION_PATH`], so the
//! same phrase always yields the same signing key, or from a raw private key.

use bip32::{DerivationPath, XPrv};
use bip39::Mnemonic;
use serde::Serialize;
use settle_crypto::{CryptoError, PrivateKey};
use std::fmt;
use thiserror::Error;

/// First account, first address: `m/44'/60'/0'/0/0`
pub const DERIVATION_PATH: &str = "m/44'/60'/0'/0/0";

/// Words in a generated mnemonic (128 bits of entropy).
pub const MNEMONIC_WORDS: usize = 12;

#[derive(Debug, Error)]
pub enum KeygenError {
    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(#[from] bip39::Error),

    #[error("key derivation failed: {0}")]
    Derivation(#[from] bip32::Error),

    #[error(transparent)]
    Key(#[from] CryptoError),
}

/// A key pair rendered the way configuration expects it: `0x`-prefixed hex.
#[derive(Serialize)]
pub struct KeyPair {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mnemonic: Option<String>,
    pub private_key: String,
    pub public_key: String,
}

impl KeyPair {
    /// Fresh random key pair with no mnemonic behind it.
    pub fn generate() -> Self {
        Self::from_key(&PrivateKey::random())
    }

    /// New 12-word mnemonic and the key derived from it.
    pub fn generate_with_mnemonic() -> Result<Self, KeygenError> {
        let mnemonic = Mnemonic::generate(MNEMONIC_WORDS)?;
        Self::derive(&mnemonic)
    }

    /// Validate `phrase` and derive its key along [`DERIVATION_PATH`].
    pub fn from_mnemonic(phrase: &str) -> Result<Self, KeygenError> {
        let mnemonic = Mnemonic::parse_normalized(phrase)?;
        Self::derive(&mnemonic)
    }

    /// Derive the public half of an existing private key.
    pub fn from_private_key_hex(private_key: &str) -> Result<Self, CryptoError> {
        PrivateKey::from_hex(private_key).map(|key| Self::from_key(&key))
    }

    fn derive(mnemonic: &Mnemonic) -> Result<Self, KeygenError> {
        let seed = mnemonic.to_seed_normalized("");
        let path: DerivationPath = DERIVATION_PATH.parse()?;
        let xprv = XPrv::derive_from_path(seed, &path)?;
        let key = PrivateKey::from_bytes(&xprv.to_bytes())?;

        Ok(Self {
            mnemonic: Some(mnemonic.to_string()),
            ..Self::from_key(&key)
        })
    }

    fn from_key(key: &PrivateKey) -> Self {
        Self {
            mnemonic: None,
            private_key: key.to_hex(),
            public_key: key.public_key().to_hex(),
        }
    }
}

impl fmt::Display for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(mnemonic) = &self.mnemonic {
            writeln!(f, "Mnemonic: {mnemonic}")?;
        }
        writeln!(f, "Private Key: {}", self.private_key)?;
        write!(f, "Public Key: {}", self.public_key)
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("mnemonic", &self.mnemonic.as_ref().map(|_| "<redacted>"))
            .field("private_key", &"<redacted>")
            .field("public_key", &self.public_key)
            .finish()
    }
}
