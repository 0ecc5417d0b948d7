//! Quiescence-based coalescing keyed by node.
//!
//! Every update re-arms the node's timer; only the value present when the
//! timer finally fires is emitted.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use page_host::{Clock, TimerHandle};
use parking_lot::Mutex;
use soulreplay_core_types::NodeId;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

struct Pending<T> {
    generation: u64,
    value: T,
    timer: TimerHandle,
}

struct State<T> {
    next_generation: u64,
    pending: HashMap<NodeId, Pending<T>>,
}

pub struct Debouncer<T> {
    window: Duration,
    clock: Arc<dyn Clock>,
    state: Arc<Mutex<State<T>>>,
    sink: UnboundedSender<T>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new(window: Duration, clock: Arc<dyn Clock>, sink: UnboundedSender<T>) -> Self {
        Self {
            window,
            clock,
            state: Arc::new(Mutex::new(State {
                next_generation: 0,
                pending: HashMap::new(),
            })),
            sink,
        }
    }

    /// Replace the pending value for `node` and restart its timer.
    ///
    /// `update` receives the value still pending for the node, if any.
    pub fn push_with(&self, node: NodeId, update: impl FnOnce(Option<T>) -> T) {
        let mut state = self.state.lock();
        state.next_generation += 1;
        let generation = state.next_generation;

        let previous = state.pending.remove(&node).map(|pending| {
            pending.timer.cancel();
            pending.value
        });
        let value = update(previous);

        let shared = Arc::clone(&self.state);
        let sink = self.sink.clone();
        let timer = self.clock.schedule(
            self.window,
            Box::new(move || {
                let fired = {
                    let mut state = shared.lock();
                    match state.pending.get(&node) {
                        Some(pending) if pending.generation == generation => {
                            state.pending.remove(&node).map(|p| p.value)
                        }
                        // Superseded by a newer update.
                        _ => None,
                    }
                };
                if let Some(value) = fired {
                    debug!(%node, "debounce window elapsed");
                    if sink.send(value).is_err() {
                        warn!(%node, "debounced value dropped, receiver closed");
                    }
                }
            }),
        );
        state.pending.insert(
            node,
            Pending {
                generation,
                value,
                timer,
            },
        );
    }

    pub fn push(&self, node: NodeId, value: T) {
        self.push_with(node, |_| value);
    }

    pub fn is_pending(&self, node: NodeId) -> bool {
        self.state.lock().pending.contains_key(&node)
    }

    pub fn pending_len(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Emit every pending value now, oldest update first, and cancel the timers.
    pub fn flush(&self) -> usize {
        let mut drained: Vec<Pending<T>> = {
            let mut state = self.state.lock();
            state.pending.drain().map(|(_, pending)| pending).collect()
        };
        drained.sort_by_key(|pending| pending.generation);
        let count = drained.len();
        for pending in drained {
            pending.timer.cancel();
            if self.sink.send(pending.value).is_err() {
                warn!("flushed value dropped, receiver closed");
            }
        }
        count
    }
}
