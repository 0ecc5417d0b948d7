use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Executor tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorPolicy {
    /// Overall time allowed for one step, resolution included
    pub step_budget_ms: u64,
    /// Run the kind-dependent post-condition check
    pub verify: bool,
    /// A failed post-condition fails the step
    pub strict: bool,
    /// Keep running a scenario after a failed step
    pub continue_on_failure: bool,
}

impl Default for ExecutorPolicy {
    fn default() -> Self {
        Self {
            step_budget_ms: 5_000,
            verify: true,
            strict: false,
            continue_on_failure: false,
        }
    }
}

impl ExecutorPolicy {
    pub fn step_budget(&self) -> Duration {
        Duration::from_millis(self.step_budget_ms)
    }
}
