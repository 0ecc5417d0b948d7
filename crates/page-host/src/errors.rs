//! Error types for host capability calls

use soulreplay_core_types::NodeId;
use thiserror::Error;

/// Failure reported by a hosting environment.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum HostError {
    /// The host refused the interaction (disabled or read-only control)
    #[error("Interaction rejected: {0}")]
    Rejected(String),

    /// The node handle no longer refers to a connected node
    #[error("Node detached: {0}")]
    Detached(NodeId),

    /// Selector or XPath the host cannot evaluate
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    /// Transport or protocol failure talking to the host
    #[error("Host I/O error: {0}")]
    Io(String),
}

impl HostError {
    /// Check if the same call may succeed later without edits
    pub fn is_retryable(&self) -> bool {
        matches!(self, HostError::Detached(_) | HostError::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(HostError::Io("socket closed".into()).is_retryable());
        assert!(HostError::Detached(NodeId(3)).is_retryable());
        assert!(!HostError::Rejected("disabled".into()).is_retryable());
        assert!(!HostError::InvalidSelector("[".into()).is_retryable());
    }
}
