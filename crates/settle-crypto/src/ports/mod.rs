//! # Ports Layer
//!
//! Capability traits that callers inject instead of concrete key material.

pub mod signer;
