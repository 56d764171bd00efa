//! Tower middleware for both ends of a signed call.

pub mod signing;
pub mod verify;

pub use signing::{SigningLayer, SigningService};
pub use verify::{VerificationConfig, VerificationLayer, VerificationService};
