//! Replay executor: Idle → Resolving → Acting → Verifying → Succeeded | Failed

use std::sync::Arc;

use action_locator::{
    ElementFinder, ElementResolver, FinderPolicy, ResolutionOutcome, ResolveRequest,
};
use chrono::Utc;
use page_host::{Clock, PageView, ReplayHost, TokioClock};
use soulreplay_core_types::{EventKind, Step};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::errors::ActionError;
use crate::policy::ExecutorPolicy;
use crate::primitives::{
    execute_click, execute_enter, execute_input, execute_navigate, navigation_target,
};
use crate::types::{ExecCtx, ExecutorState, StepResult, Verification};
use crate::verify::{verify_url, verify_value};

/// Executes captured steps one at a time against a replay host.
///
/// There is no internal retry beyond the finder's poll loop; a failed step is
/// reported and the caller decides what to do with the run.
pub struct ReplayActionExecutor {
    policy: ExecutorPolicy,
    finder: Arc<dyn ElementResolver>,
    clock: Arc<dyn Clock>,
}

impl Default for ReplayActionExecutor {
    fn default() -> Self {
        Self::new(ExecutorPolicy::default(), FinderPolicy::default())
    }
}

impl ReplayActionExecutor {
    pub fn new(policy: ExecutorPolicy, finder_policy: FinderPolicy) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(TokioClock);
        let finder = Arc::new(ElementFinder::with_clock(finder_policy, clock.clone()));
        Self::with_resolver(policy, finder, clock)
    }

    pub fn with_resolver(
        policy: ExecutorPolicy,
        finder: Arc<dyn ElementResolver>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            policy,
            finder,
            clock,
        }
    }

    pub fn policy(&self) -> &ExecutorPolicy {
        &self.policy
    }

    /// Fresh context for one step, bounded by the step budget.
    pub fn context(&self, cancel: &CancellationToken) -> ExecCtx {
        ExecCtx::new(self.clock.now() + self.policy.step_budget(), cancel.clone())
    }

    /// Execute one step. Always returns a report, never an error.
    #[instrument(skip_all, fields(step = %step.id, event = ?step.event))]
    pub async fn execute<H: ReplayHost>(&self, host: &H, step: &Step, ctx: &ExecCtx) -> StepResult {
        let started_at = Utc::now();
        let start = self.clock.now();
        let mut run = Run::default();
        info!(action_id = %ctx.action_id, label = %step.label, "executing step");

        let outcome = self.drive(host, step, ctx, &mut run).await;
        let duration_ms = self.clock.now().duration_since(start).as_millis() as u64;

        let (ok, reason, message) = match outcome {
            Ok(()) => {
                run.enter(ExecutorState::Succeeded);
                info!(action_id = %ctx.action_id, duration_ms, "step succeeded");
                (true, None, None)
            }
            Err(err) => {
                run.enter(ExecutorState::Failed);
                let reason = err.reason();
                warn!(action_id = %ctx.action_id, duration_ms, reason = reason.name(), error = %err, "step failed");
                (false, Some(reason), Some(err.to_string()))
            }
        };

        StepResult {
            step_id: step.id.clone(),
            event: step.event,
            ok,
            started_at,
            duration_ms,
            strategy: run.resolution.as_ref().map(|r| r.strategy),
            confidence: run.resolution.as_ref().map(|r| r.confidence),
            attempts: run.attempts,
            skipped_hops: run.resolution.as_ref().map(|r| r.skipped_hops).unwrap_or(0),
            reason,
            message,
            verification: run.verification,
            states: run.states,
        }
    }

    async fn drive<H: ReplayHost>(
        &self,
        host: &H,
        step: &Step,
        ctx: &ExecCtx,
        run: &mut Run,
    ) -> Result<(), ActionError> {
        if ctx.is_cancelled() {
            return Err(ActionError::Cancelled);
        }
        step.bundle.validate()?;

        if step.event == EventKind::Navigate {
            let url = navigation_target(step)?;
            run.enter(ExecutorState::Acting);
            execute_navigate(host, ctx, &url).await?;
            if self.policy.verify {
                run.enter(ExecutorState::Verifying);
                self.settle(run, verify_url(host, &url))?;
            }
            return Ok(());
        }

        run.enter(ExecutorState::Resolving);
        let resolution = self.resolve(host, step, ctx, run).await?;
        let node = resolution.node;
        run.resolution = Some(resolution);

        run.enter(ExecutorState::Acting);
        let written = match step.event {
            EventKind::Click => {
                execute_click(host, ctx, node).await?;
                None
            }
            EventKind::Input => Some(execute_input(host, ctx, node, step.value.as_deref()).await?),
            EventKind::Enter => {
                execute_enter(host, ctx, node).await?;
                None
            }
            EventKind::Navigate => None,
        };

        if self.policy.verify {
            run.enter(ExecutorState::Verifying);
            let verification = match &written {
                Some(value) => verify_value(host, node, value),
                None => Verification::Skipped,
            };
            self.settle(run, verification)?;
        }
        Ok(())
    }

    async fn resolve<H: ReplayHost>(
        &self,
        host: &H,
        step: &Step,
        ctx: &ExecCtx,
        run: &mut Run,
    ) -> Result<ResolutionOutcome, ActionError> {
        let remaining = ctx.deadline.saturating_duration_since(self.clock.now());
        if remaining.is_zero() {
            return Err(ActionError::Timeout(format!(
                "no budget left to resolve {}",
                step.bundle.xpath
            )));
        }
        let finder_timeout = self.finder.default_timeout();
        let budget_bound = remaining < finder_timeout;
        let request = ResolveRequest::new(&step.bundle)
            .with_label_hint(&step.label)
            .with_timeout(finder_timeout.min(remaining))
            .with_cancel(ctx.cancel_token.clone());

        let page: &dyn PageView = host;
        match self.finder.resolve(page, request).await {
            Ok(outcome) => {
                run.attempts = outcome.attempts;
                debug!(strategy = outcome.strategy.name(), attempts = outcome.attempts, "step target resolved");
                Ok(outcome)
            }
            Err(err) => {
                run.attempts = err.attempts();
                let err = ActionError::from(err);
                match err {
                    ActionError::NotFound { elapsed_ms, .. } if budget_bound => {
                        Err(ActionError::Timeout(format!(
                            "step budget of {}ms exhausted after {}ms of resolution",
                            self.policy.step_budget_ms, elapsed_ms
                        )))
                    }
                    other => Err(other),
                }
            }
        }
    }

    /// Record a verification; only strict mode turns a failure into an error.
    fn settle(&self, run: &mut Run, verification: Verification) -> Result<(), ActionError> {
        let failed = match &verification {
            Verification::Failed { expected, actual } => {
                Some(format!("expected {:?}, found {:?}", expected, actual))
            }
            Verification::Passed | Verification::Skipped => None,
        };
        run.verification = verification;
        match failed {
            Some(detail) if self.policy.strict => Err(ActionError::VerificationFailed(detail)),
            Some(detail) => {
                warn!(%detail, "post-condition failed, step kept as succeeded");
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Execute `steps` strictly in order.
    ///
    /// Stops after the first failure unless `continue_on_failure` is set;
    /// cancelling `cancel` aborts the step in flight.
    pub async fn run<H: ReplayHost>(
        &self,
        host: &H,
        steps: &[Step],
        cancel: &CancellationToken,
    ) -> Vec<StepResult> {
        let mut results = Vec::with_capacity(steps.len());
        for step in steps {
            let ctx = self.context(cancel);
            let result = self.execute(host, step, &ctx).await;
            let failed = !result.ok;
            results.push(result);
            if failed && (!self.policy.continue_on_failure || cancel.is_cancelled()) {
                break;
            }
        }
        results
    }
}

/// Mutable bookkeeping for one step.
struct Run {
    states: Vec<ExecutorState>,
    resolution: Option<ResolutionOutcome>,
    attempts: u32,
    verification: Verification,
}

impl Default for Run {
    fn default() -> Self {
        Self {
            states: vec![ExecutorState::Idle],
            resolution: None,
            attempts: 0,
            verification: Verification::Skipped,
        }
    }
}

impl Run {
    fn enter(&mut self, next: ExecutorState) {
        let current = self.states.last().copied().unwrap_or(ExecutorState::Idle);
        debug_assert!(current.can_transition(next), "{:?} -> {:?}", current, next);
        self.states.push(next);
    }
}
