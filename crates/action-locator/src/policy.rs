use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::LocatorStrategy;

/// Finder tuning. Times are in milliseconds to keep config files flat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinderPolicy {
    pub poll_interval_ms: u64,
    pub timeout_ms: u64,
    /// Reject hidden or zero-area candidates
    pub visibility_gate: bool,
    /// Minimum normalized similarity accepted by the fuzzy text strategy
    pub fuzzy_min_similarity: f64,
    /// Largest centre distance accepted by the geometry strategy
    pub geometry_radius_px: f64,
    /// Active strategies in evaluation order
    pub strategies: Vec<LocatorStrategy>,
}

impl Default for FinderPolicy {
    fn default() -> Self {
        Self {
            poll_interval_ms: 150,
            timeout_ms: 2_000,
            visibility_gate: true,
            fuzzy_min_similarity: 0.6,
            geometry_radius_px: 64.0,
            strategies: LocatorStrategy::fallback_chain(),
        }
    }
}

impl FinderPolicy {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Configured strategies with duplicates removed, first occurrence wins.
    pub fn strategy_chain(&self) -> Vec<LocatorStrategy> {
        let mut chain: Vec<LocatorStrategy> = Vec::with_capacity(self.strategies.len());
        for strategy in &self.strategies {
            if !chain.contains(strategy) {
                chain.push(*strategy);
            }
        }
        chain
    }
}
