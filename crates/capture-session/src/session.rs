//! Capture session: raw interactions in, labelled steps out.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use bundle_builder::{BoundaryIndex, BundleBuilder};
use page_host::{Clock, PageView};
use parking_lot::Mutex;
use soulreplay_core_types::{EventKind, NodeId, Step};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::debounce::Debouncer;
use crate::errors::CaptureError;
use crate::events::{Disposition, RawInteraction};
use crate::policy::CapturePolicy;
use crate::throttle::Throttle;

/// Records interactions on one page.
///
/// Discrete events (click, enter, navigation) are throttled per kind; text
/// entry is debounced per node. A discrete event first flushes pending text
/// so steps keep the order the user produced them in.
pub struct CaptureSession<P: PageView + 'static> {
    page: Arc<P>,
    builder: Arc<BundleBuilder>,
    index: Arc<BoundaryIndex>,
    clock: Arc<dyn Clock>,
    throttle: Throttle,
    debouncer: Debouncer<Step>,
    steps: UnboundedSender<Step>,
    sequence: Arc<AtomicU64>,
    stopped: AtomicBool,
    cancel: CancellationToken,
    follower: Mutex<Option<JoinHandle<()>>>,
}

impl<P: PageView + 'static> CaptureSession<P> {
    /// Start recording. Must be called inside a tokio runtime; the boundary
    /// index follows document mutations in the background until [`stop`].
    ///
    /// [`stop`]: CaptureSession::stop
    pub fn start(
        page: Arc<P>,
        builder: Arc<BundleBuilder>,
        policy: CapturePolicy,
        clock: Arc<dyn Clock>,
    ) -> (Self, UnboundedReceiver<Step>) {
        let (steps, receiver) = mpsc::unbounded_channel();
        let index = Arc::new(BoundaryIndex::scan(page.as_ref(), builder.policy().clone()));
        let cancel = CancellationToken::new();
        let follower = index.spawn_follow(page.clone(), cancel.clone());
        info!(scopes = index.len(), "capture session started");

        let session = Self {
            debouncer: Debouncer::new(policy.debounce_window(), clock.clone(), steps.clone()),
            throttle: Throttle::new(policy.throttle_window()),
            page,
            builder,
            index,
            clock,
            steps,
            sequence: Arc::new(AtomicU64::new(0)),
            stopped: AtomicBool::new(false),
            cancel,
            follower: Mutex::new(Some(follower)),
        };
        (session, receiver)
    }

    pub fn index(&self) -> &BoundaryIndex {
        &self.index
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    fn next_id(&self) -> String {
        format!("step-{}", self.sequence.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Handle one interaction. Cheap and bounded; never walks the whole tree.
    pub fn record(&self, interaction: RawInteraction) -> Result<Disposition, CaptureError> {
        if self.is_stopped() {
            return Err(CaptureError::Stopped);
        }
        if let Some(node) = interaction.node() {
            if !self.page.is_connected(node) {
                return Err(CaptureError::Disconnected(node));
            }
        }

        let kind = interaction.kind();
        if kind == EventKind::Input {
            if let RawInteraction::Keystroke { node, value } = interaction {
                self.debounce_input(node, value);
            }
            return Ok(Disposition::Debounced);
        }

        if !self.throttle.admit(kind, self.clock.now()) {
            debug!(event = kind.name(), "event throttled");
            return Ok(Disposition::Throttled);
        }
        let flushed = self.debouncer.flush();
        if flushed > 0 {
            debug!(flushed, "pending input flushed ahead of discrete event");
        }

        let step = match interaction {
            RawInteraction::Navigation { url } => self.builder.navigation_step(self.next_id(), &url),
            RawInteraction::Click { node } | RawInteraction::EnterKey { node } => {
                self.builder.capture_step(
                    self.page.as_ref(),
                    self.next_id(),
                    node,
                    kind,
                    Some(&self.index),
                )
            }
            RawInteraction::Keystroke { .. } => return Ok(Disposition::Debounced),
        };
        debug!(step = %step.id, label = %step.label, event = kind.name(), "step captured");
        self.steps
            .send(step)
            .map_err(|_| CaptureError::ChannelClosed)?;
        Ok(Disposition::Emitted)
    }

    fn debounce_input(&self, node: NodeId, value: String) {
        self.debouncer.push_with(node, |pending| {
            // The bundle is captured once per burst, on its first keystroke.
            let step = pending.unwrap_or_else(|| {
                self.builder.capture_step(
                    self.page.as_ref(),
                    self.next_id(),
                    node,
                    EventKind::Input,
                    Some(&self.index),
                )
            });
            step.with_value(value)
        });
    }

    /// Flush every pending input synchronously and stop following the page.
    /// Returns the number of flushed steps.
    pub fn stop(&self) -> usize {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return 0;
        }
        let flushed = self.debouncer.flush();
        self.cancel.cancel();
        if let Some(follower) = self.follower.lock().take() {
            follower.abort();
        }
        let swept = self.builder.sweep_labels(self.page.as_ref());
        info!(flushed, swept, "capture session stopped");
        flushed
    }
}

impl<P: PageView + 'static> Drop for CaptureSession<P> {
    fn drop(&mut self) {
        if !self.is_stopped() {
            warn!("capture session dropped without stop, flushing");
            self.stop();
        }
    }
}
