//! # Domain Layer
//!
//! Pure cryptographic logic with no I/O dependencies.

pub mod digest;
pub mod ecdsa;
pub mod errors;
pub mod keys;
