//! Per-kind hard rate cap. Excess events are dropped, never queued.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use soulreplay_core_types::EventKind;
use tokio::time::Instant;

pub struct Throttle {
    window: Duration,
    last_accepted: Mutex<HashMap<EventKind, Instant>>,
}

impl Throttle {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_accepted: Mutex::new(HashMap::new()),
        }
    }

    /// Accept an event of `kind` at `now` unless one was accepted less than a
    /// window ago. Dropped events do not extend the window.
    pub fn admit(&self, kind: EventKind, now: Instant) -> bool {
        let mut last = self.last_accepted.lock();
        match last.get(&kind) {
            Some(previous) if now.saturating_duration_since(*previous) < self.window => false,
            _ => {
                last.insert(kind, now);
                true
            }
        }
    }

    pub fn reset(&self) {
        self.last_accepted.lock().clear();
    }
}
