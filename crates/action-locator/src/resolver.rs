//! Element finder: strategy chain orchestration and polling

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use page_host::{Clock, PageView, TokioClock};
use soulreplay_core_types::LocatorBundle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::LocatorError;
use crate::policy::FinderPolicy;
use crate::scope::{descend, Descent};
use crate::strategies::{evaluate, StrategyInput};
use crate::types::{ResolutionOutcome, StrategyResult};

/// One resolution request.
#[derive(Debug, Clone)]
pub struct ResolveRequest<'a> {
    pub bundle: &'a LocatorBundle,
    /// Step label, used by text similarity when the bundle has no text
    pub label_hint: Option<&'a str>,
    /// Overrides the policy timeout when set
    pub timeout: Option<Duration>,
    pub cancel: CancellationToken,
}

impl<'a> ResolveRequest<'a> {
    pub fn new(bundle: &'a LocatorBundle) -> Self {
        Self {
            bundle,
            label_hint: None,
            timeout: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_label_hint(mut self, hint: &'a str) -> Self {
        self.label_hint = Some(hint);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Element resolver trait
#[async_trait]
pub trait ElementResolver: Send + Sync {
    /// Poll the strategy chain until a match, the timeout or cancellation.
    async fn resolve(
        &self,
        page: &dyn PageView,
        request: ResolveRequest<'_>,
    ) -> Result<ResolutionOutcome, LocatorError>;

    /// Timeout applied when a request does not carry its own.
    fn default_timeout(&self) -> Duration;

    /// A single pass over the strategy chain without waiting.
    fn attempt(
        &self,
        page: &dyn PageView,
        bundle: &LocatorBundle,
        label_hint: Option<&str>,
    ) -> Option<(StrategyResult, Descent)>;
}

/// Default resolver: ordered strategies, first visible match wins.
pub struct ElementFinder {
    policy: FinderPolicy,
    clock: Arc<dyn Clock>,
}

impl Default for ElementFinder {
    fn default() -> Self {
        Self::new(FinderPolicy::default())
    }
}

impl ElementFinder {
    pub fn new(policy: FinderPolicy) -> Self {
        Self::with_clock(policy, Arc::new(TokioClock))
    }

    pub fn with_clock(policy: FinderPolicy, clock: Arc<dyn Clock>) -> Self {
        Self { policy, clock }
    }

    pub fn policy(&self) -> &FinderPolicy {
        &self.policy
    }
}

#[async_trait]
impl ElementResolver for ElementFinder {
    async fn resolve(
        &self,
        page: &dyn PageView,
        request: ResolveRequest<'_>,
    ) -> Result<ResolutionOutcome, LocatorError> {
        request.bundle.validate()?;

        let timeout = request.timeout.unwrap_or_else(|| self.default_timeout());
        let poll = self.policy.poll_interval();
        let started = self.clock.now();
        let mut attempts: u32 = 0;
        info!(xpath = %request.bundle.xpath, tag = %request.bundle.tag, ?timeout, "resolving element");

        loop {
            let elapsed = self.clock.now().duration_since(started);
            if request.cancel.is_cancelled() {
                return Err(LocatorError::Cancelled {
                    attempts,
                    elapsed_ms: elapsed.as_millis() as u64,
                });
            }

            attempts += 1;
            if let Some((hit, descent)) = self.attempt(page, request.bundle, request.label_hint) {
                let elapsed = self.clock.now().duration_since(started);
                info!(
                    strategy = hit.strategy.name(),
                    node = %hit.node,
                    confidence = hit.confidence,
                    attempts,
                    "element resolved"
                );
                return Ok(ResolutionOutcome {
                    node: hit.node,
                    strategy: hit.strategy,
                    confidence: hit.confidence,
                    elapsed,
                    attempts,
                    scope: descent.scope,
                    skipped_hops: descent.skipped,
                });
            }

            let elapsed = self.clock.now().duration_since(started);
            if elapsed >= timeout {
                warn!(attempts, elapsed_ms = elapsed.as_millis() as u64, "element not found");
                return Err(LocatorError::NotFound {
                    attempts,
                    elapsed_ms: elapsed.as_millis() as u64,
                });
            }

            let pause = poll.min(timeout - elapsed);
            debug!(attempts, ?pause, "no match yet, polling");
            tokio::select! {
                _ = request.cancel.cancelled() => {}
                _ = self.clock.sleep(pause) => {}
            }
        }
    }

    fn default_timeout(&self) -> Duration {
        self.policy.timeout()
    }

    fn attempt(
        &self,
        page: &dyn PageView,
        bundle: &LocatorBundle,
        label_hint: Option<&str>,
    ) -> Option<(StrategyResult, Descent)> {
        let descent = descend(page, &bundle.boundary_chain);
        let input = StrategyInput {
            page,
            scope: descent.scope,
            bundle,
            policy: &self.policy,
            label_hint,
        };
        for strategy in self.policy.strategy_chain() {
            match evaluate(strategy, &input) {
                Ok(Some(hit)) => return Some((hit, descent)),
                Ok(None) => debug!(strategy = strategy.name(), "strategy produced no visible match"),
                Err(err) => warn!(strategy = strategy.name(), error = %err, "strategy failed"),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LocatorStrategy;
    use page_host::{MemoryPage, NodeSpec};
    use soulreplay_core_types::BundleError;

    #[tokio::test(start_paused = true)]
    async fn invalid_bundle_fails_immediately() {
        let page = MemoryPage::with_body("https://example.test/", Vec::<NodeSpec>::new());
        let bundle = LocatorBundle::new("input", "");
        let err = ElementFinder::default()
            .resolve(&page, ResolveRequest::new(&bundle))
            .await
            .unwrap_err();
        assert_eq!(err, LocatorError::InvalidBundle(BundleError::MissingXPath));
    }

    #[tokio::test(start_paused = true)]
    async fn first_strategy_in_chain_wins() {
        let page = MemoryPage::with_body(
            "https://example.test/",
            [NodeSpec::new("input").id("email").attr("name", "email")],
        );
        let mut bundle = LocatorBundle::new("input", "/html[1]/body[1]/input[1]");
        bundle.id = Some("email".into());
        bundle.name = Some("email".into());

        let outcome = ElementFinder::default()
            .resolve(&page, ResolveRequest::new(&bundle))
            .await
            .unwrap();
        assert_eq!(outcome.strategy, LocatorStrategy::Xpath);
        assert_eq!(outcome.attempts, 1);

        let reordered = ElementFinder::new(FinderPolicy {
            strategies: vec![LocatorStrategy::Name, LocatorStrategy::Xpath],
            ..FinderPolicy::default()
        });
        let outcome = reordered
            .resolve(&page, ResolveRequest::new(&bundle))
            .await
            .unwrap();
        assert_eq!(outcome.strategy, LocatorStrategy::Name);
        assert_eq!(outcome.confidence, 0.8);
    }
}
