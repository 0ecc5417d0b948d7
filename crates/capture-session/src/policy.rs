use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Capture-side rate limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapturePolicy {
    /// At most one discrete event per kind within this window
    pub throttle_ms: u64,
    /// Quiet period before a text entry burst becomes one step
    pub debounce_ms: u64,
}

impl Default for CapturePolicy {
    fn default() -> Self {
        Self {
            throttle_ms: 100,
            debounce_ms: 500,
        }
    }
}

impl CapturePolicy {
    pub fn throttle_window(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }

    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
