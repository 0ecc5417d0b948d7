//! Error types for replay actions

use action_locator::LocatorError;
use page_host::HostError;
use serde::{Deserialize, Serialize};
use soulreplay_core_types::BundleError;
use thiserror::Error;

/// Classified failure reported on a [`StepResult`](crate::StepResult).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// No strategy matched within the finder timeout
    NotFound,
    /// The step budget ran out
    Timeout,
    /// The host refused the interaction (disabled, read-only, ...)
    ActionRejected,
    /// The step cannot be executed as recorded
    InvalidBundle,
    /// The run was cancelled while the step was in flight
    Cancelled,
    /// Post-condition failed in strict mode
    VerificationFailed,
}

impl FailureReason {
    pub fn is_retryable(&self) -> bool {
        matches!(self, FailureReason::NotFound | FailureReason::Timeout)
    }

    pub fn name(&self) -> &'static str {
        match self {
            FailureReason::NotFound => "not_found",
            FailureReason::Timeout => "timeout",
            FailureReason::ActionRejected => "action_rejected",
            FailureReason::InvalidBundle => "invalid_bundle",
            FailureReason::Cancelled => "cancelled",
            FailureReason::VerificationFailed => "verification_failed",
        }
    }
}

/// Errors raised while executing one step
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ActionError {
    #[error("Element not found after {attempts} attempt(s) in {elapsed_ms}ms")]
    NotFound { attempts: u32, elapsed_ms: u64 },

    /// Step budget exceeded
    #[error("Step budget exceeded: {0}")]
    Timeout(String),

    #[error("Invalid bundle: {0}")]
    InvalidBundle(#[from] BundleError),

    /// Navigation target missing or not a URL
    #[error("Invalid navigation target: {0}")]
    InvalidUrl(String),

    /// Host-side failure while acting on a resolved node
    #[error("Host error: {0}")]
    Host(#[from] HostError),

    #[error("Step cancelled")]
    Cancelled,

    #[error("Verification failed: {0}")]
    VerificationFailed(String),
}

impl From<LocatorError> for ActionError {
    fn from(err: LocatorError) -> Self {
        match err {
            LocatorError::NotFound {
                attempts,
                elapsed_ms,
            } => ActionError::NotFound {
                attempts,
                elapsed_ms,
            },
            LocatorError::InvalidBundle(err) => ActionError::InvalidBundle(err),
            LocatorError::Cancelled { .. } => ActionError::Cancelled,
        }
    }
}

impl ActionError {
    pub fn reason(&self) -> FailureReason {
        match self {
            ActionError::NotFound { .. } => FailureReason::NotFound,
            ActionError::Timeout(_) => FailureReason::Timeout,
            ActionError::InvalidBundle(_) | ActionError::InvalidUrl(_) => {
                FailureReason::InvalidBundle
            }
            ActionError::Host(host) => match host {
                // The node vanished between resolution and dispatch.
                HostError::Detached(_) => FailureReason::NotFound,
                HostError::Rejected(_) | HostError::InvalidSelector(_) | HostError::Io(_) => {
                    FailureReason::ActionRejected
                }
            },
            ActionError::Cancelled => FailureReason::Cancelled,
            ActionError::VerificationFailed(_) => FailureReason::VerificationFailed,
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        self.reason().is_retryable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soulreplay_core_types::NodeId;

    #[test]
    fn locator_errors_map_to_reasons() {
        let not_found: ActionError = LocatorError::NotFound {
            attempts: 2,
            elapsed_ms: 100,
        }
        .into();
        assert_eq!(not_found.reason(), FailureReason::NotFound);
        assert!(not_found.is_retryable());

        let invalid: ActionError = LocatorError::InvalidBundle(BundleError::MissingXPath).into();
        assert_eq!(invalid.reason(), FailureReason::InvalidBundle);
        assert!(!invalid.is_retryable());

        let cancelled: ActionError = LocatorError::Cancelled {
            attempts: 1,
            elapsed_ms: 0,
        }
        .into();
        assert_eq!(cancelled.reason(), FailureReason::Cancelled);
    }

    #[test]
    fn host_errors_map_to_reasons() {
        let rejected = ActionError::from(HostError::Rejected("disabled".into()));
        assert_eq!(rejected.reason(), FailureReason::ActionRejected);
        assert!(!rejected.is_retryable());
        let detached = ActionError::from(HostError::Detached(NodeId(4)));
        assert_eq!(detached.reason(), FailureReason::NotFound);
    }

    #[test]
    fn reason_serializes_snake_case() {
        let json = serde_json::to_string(&FailureReason::ActionRejected).unwrap();
        assert_eq!(json, format!("\"{}\"", FailureReason::ActionRejected.name()));
    }
}
