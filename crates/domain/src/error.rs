//! Common error types used across the workspace.
//!
//! Every layer works with typed errors and converts upward via `#[from]`;
//! soft escalations (quiet hours, rate limiting) are routing outcomes, not
//! errors, so they never appear here.

use crate::guardrail::DecisionReason;

/// Umbrella error for the autohome core.
#[derive(Debug, thiserror::Error)]
pub enum AutoHomeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error(transparent)]
    Guardrail(#[from] GuardrailViolation),

    #[error(transparent)]
    Approval(#[from] ApprovalError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// A malformed intent, rejected before guardrail evaluation.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("entity key '{0}' is not of the form 'domain.object_id'")]
    MalformedEntityKey(String),

    #[error("unknown device '{0}'")]
    UnknownDevice(String),

    #[error("device '{0}' is unavailable")]
    DeviceUnavailable(String),

    #[error("intent '{0}' cannot be executed as a device command")]
    UnsupportedIntent(&'static str),

    #[error("guardrail bounds are inverted: min {min} > max {max}")]
    InvertedBounds { min: f64, max: f64 },

    #[error("quiet hour {0} is out of range 0-23")]
    InvalidQuietHour(u8),
}

/// A lookup that found nothing.
#[derive(Debug, thiserror::Error)]
#[error("{entity} '{id}' not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// A hard guardrail block, carrying every violated reason.
#[derive(Debug, PartialEq, thiserror::Error)]
#[error("blocked by guardrail: {}", .reasons.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "))]
pub struct GuardrailViolation {
    pub reasons: Vec<DecisionReason>,
}

/// Failures when resolving an approval queue item.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ApprovalError {
    /// The item's deadline passed while it was still pending. Its stored
    /// status stays `Pending` so callers can tell "expired" apart from
    /// "explicitly rejected".
    #[error("approval item '{0}' expired before it was resolved")]
    Expired(String),

    /// The item was already approved or rejected; resolution happens once.
    #[error("approval item '{0}' was already resolved")]
    AlreadyResolved(String),
}

/// A device backend call that failed or timed out.
///
/// Never retried internally; the caller decides whether to retry.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("device backend rejected the call: {0}")]
    Backend(String),

    #[error("device backend call timed out after {0} ms")]
    Timeout(u64),

    #[error("service '{service}' is not supported by '{entity_id}'")]
    UnsupportedService { entity_id: String, service: String },
}
