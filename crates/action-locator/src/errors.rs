//! Error types for locator system

use soulreplay_core_types::BundleError;
use thiserror::Error;

/// Locator error enumeration
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LocatorError {
    /// No strategy produced a visible match before the timeout
    #[error("Element not found after {attempts} attempt(s) in {elapsed_ms}ms")]
    NotFound { attempts: u32, elapsed_ms: u64 },

    /// The bundle cannot be resolved at all
    #[error("Invalid bundle: {0}")]
    InvalidBundle(#[from] BundleError),

    /// The caller cancelled the run while polling
    #[error("Resolution cancelled after {attempts} attempt(s) in {elapsed_ms}ms")]
    Cancelled { attempts: u32, elapsed_ms: u64 },
}

impl LocatorError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, LocatorError::NotFound { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            LocatorError::NotFound { attempts, .. } | LocatorError::Cancelled { attempts, .. } => {
                *attempts
            }
            LocatorError::InvalidBundle(_) => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_not_found_is_retryable() {
        assert!(LocatorError::NotFound {
            attempts: 3,
            elapsed_ms: 300
        }
        .is_retryable());
        assert!(!LocatorError::InvalidBundle(BundleError::MissingXPath).is_retryable());
        assert!(!LocatorError::Cancelled {
            attempts: 1,
            elapsed_ms: 0
        }
        .is_retryable());
    }
}
