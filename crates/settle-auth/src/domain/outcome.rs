//! Per-request verification result handed from the HTTP layer to the RPC layer.

use super::error::RpcError;
use axum::http::Extensions;

/// Result of authenticating one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    Verified,
    Failed(RpcError),
}

impl VerificationOutcome {
    pub fn is_verified(&self) -> bool {
        matches!(self, VerificationOutcome::Verified)
    }
}

/// Extension slot; the type is private so nothing outside this crate can
/// read or forge an outcome.
#[derive(Clone)]
struct OutcomeSlot(VerificationOutcome);

pub(crate) fn attach(extensions: &mut Extensions, outcome: VerificationOutcome) {
    extensions.insert(OutcomeSlot(outcome));
}

/// Remove the outcome; a second call returns `None`.
pub(crate) fn take(extensions: &mut Extensions) -> Option<VerificationOutcome> {
    extensions.remove::<OutcomeSlot>().map(|slot| slot.0)
}
