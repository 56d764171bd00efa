//! # Settlement Request Crypto
//!
//! secp256k1 primitives used to authenticate requests between the network and
//! its providers.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): Pure cryptographic logic, no I/O
//! - **Ports Layer** (`ports/`): Capability traits that callers inject (signing)
//!
//! ## Wire Conventions
//!
//! - Public keys are always the 65-byte uncompressed SEC1 form `0x04 || X || Y`
//! - Digests are legacy Keccak-256 (NOT SHA3-256)
//! - Signatures are 65 bytes `R || S || V` with `V` in {0, 1} (Ethereum style,
//!   never the 27/28 offset form)
//!
//! Every function in this crate is stateless and safe to call concurrently.

pub mod domain;
pub mod ports;

// Re-export public API
pub use domain::digest::{keccak256, Digest, DIGEST_LENGTH};
pub use domain::ecdsa::{
    recover_public_key, sign, verify, RecoverableSignature, SignedDigest, SIGNATURE_LENGTH,
};
pub use domain::errors::CryptoError;
pub use domain::keys::{PrivateKey, PublicKey, PRIVATE_KEY_LENGTH, PUBLIC_KEY_LENGTH};
pub use ports::signer::{DigestSigner, LocalSigner};
