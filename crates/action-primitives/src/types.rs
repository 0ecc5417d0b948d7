//! Core data types for replay execution

use std::time::Duration;

use action_locator::LocatorStrategy;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use soulreplay_core_types::{ActionId, EventKind};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::errors::FailureReason;

/// Execution context for one step
///
/// Carries the step deadline, the run-wide cancellation token and a unique
/// action id for log correlation.
#[derive(Clone, Debug)]
pub struct ExecCtx {
    pub deadline: Instant,
    pub cancel_token: CancellationToken,
    pub action_id: ActionId,
}

impl ExecCtx {
    pub fn new(deadline: Instant, cancel_token: CancellationToken) -> Self {
        Self {
            deadline,
            cancel_token,
            action_id: ActionId::new(),
        }
    }

    /// Context whose deadline is `budget` from now.
    pub fn with_budget(budget: Duration, cancel_token: CancellationToken) -> Self {
        Self::new(Instant::now() + budget, cancel_token)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    pub fn is_timeout(&self) -> bool {
        Instant::now() >= self.deadline
    }

    pub fn remaining_time(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}

/// Executor state machine. `Succeeded` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutorState {
    Idle,
    Resolving,
    Acting,
    Verifying,
    Succeeded,
    Failed,
}

impl ExecutorState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExecutorState::Succeeded | ExecutorState::Failed)
    }

    /// Whether the machine may move from `self` to `next`.
    pub fn can_transition(&self, next: ExecutorState) -> bool {
        use ExecutorState::*;
        matches!(
            (self, next),
            (Idle, Resolving)
                | (Idle, Acting)
                | (Idle, Failed)
                | (Resolving, Acting)
                | (Resolving, Failed)
                | (Acting, Verifying)
                | (Acting, Succeeded)
                | (Acting, Failed)
                | (Verifying, Succeeded)
                | (Verifying, Failed)
        )
    }
}

/// Outcome of the post-condition check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Verification {
    /// Not run, or nothing to check for this kind
    Skipped,
    Passed,
    Failed { expected: String, actual: String },
}

impl Verification {
    pub fn is_failed(&self) -> bool {
        matches!(self, Verification::Failed { .. })
    }
}

impl Default for Verification {
    fn default() -> Self {
        Verification::Skipped
    }
}

/// Report for one executed step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub step_id: String,
    pub event: EventKind,
    pub ok: bool,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub started_at: DateTime<Utc>,

    pub duration_ms: u64,

    /// Winning strategy, when a node was resolved
    pub strategy: Option<LocatorStrategy>,
    pub confidence: Option<f64>,

    /// Finder poll attempts
    pub attempts: u32,

    /// Boundary hops that could not be re-entered
    pub skipped_hops: usize,

    pub reason: Option<FailureReason>,
    pub message: Option<String>,

    #[serde(default)]
    pub verification: Verification,

    /// States visited, in order
    pub states: Vec<ExecutorState>,
}

impl StepResult {
    pub fn final_state(&self) -> ExecutorState {
        self.states.last().copied().unwrap_or(ExecutorState::Idle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions() {
        use ExecutorState::*;
        assert!(Idle.can_transition(Resolving));
        assert!(Resolving.can_transition(Failed));
        assert!(Verifying.can_transition(Succeeded));
        assert!(!Succeeded.can_transition(Acting));
        assert!(!Failed.can_transition(Idle));
        assert!(!Idle.can_transition(Verifying));
        assert!(Failed.is_terminal() && Succeeded.is_terminal());
        assert!(!Acting.is_terminal());
    }

    #[tokio::test(start_paused = true)]
    async fn budget_counts_down() {
        let ctx = ExecCtx::with_budget(Duration::from_millis(200), CancellationToken::new());
        assert!(!ctx.is_timeout());
        tokio::time::advance(Duration::from_millis(250)).await;
        assert!(ctx.is_timeout());
        assert_eq!(ctx.remaining_time(), Duration::ZERO);
    }

    #[test]
    fn verification_serializes_tagged() {
        let json = serde_json::to_value(Verification::Failed {
            expected: "a".into(),
            actual: "b".into(),
        })
        .unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["expected"], "a");
    }
}
