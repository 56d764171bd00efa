//! # Ports Layer
//!
//! Capabilities injected into the transport and the middleware.
//! - **Clock**: source of "now" for timestamps and the replay window
//! - **SignatureCheck**: decides whether a signed message is acceptable

pub mod check;
pub mod clock;
