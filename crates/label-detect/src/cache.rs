use dashmap::DashMap;
use page_host::PageView;
use soulreplay_core_types::NodeId;

use crate::engine::{DetectedLabel, LabelEngine};
use crate::heuristics::LabelContext;

#[derive(Clone, Debug)]
struct Entry {
    /// `type` of an input at detection time; `None` for other elements
    input_type: Option<String>,
    label: DetectedLabel,
}

fn live_input_type(page: &dyn PageView, node: NodeId) -> Option<String> {
    LabelContext::new(page, node).input_type()
}

/// Identity-keyed label cache.
///
/// Entries do not keep nodes alive; an entry whose node is no longer
/// connected is dropped on the next read or by [`LabelCache::sweep`].
/// An entry is also dropped once the input `type` it was detected under
/// changes, and password controls are never served from the cache.
#[derive(Default)]
pub struct LabelCache {
    entries: DashMap<NodeId, Entry>,
}

impl LabelCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, page: &dyn PageView, node: NodeId) -> Option<DetectedLabel> {
        if !page.is_connected(node) {
            self.entries.remove(&node);
            return None;
        }
        let input_type = live_input_type(page, node);
        if input_type.as_deref() == Some("password") {
            self.entries.remove(&node);
            return Some(DetectedLabel::password());
        }
        let stale = match self.entries.get(&node) {
            Some(entry) if entry.input_type == input_type => return Some(entry.label.clone()),
            Some(_) => true,
            None => false,
        };
        if stale {
            self.entries.remove(&node);
        }
        None
    }

    /// Store `label` for `node`, keyed to the node's current input type.
    pub fn put(&self, page: &dyn PageView, node: NodeId, label: DetectedLabel) {
        let input_type = live_input_type(page, node);
        self.entries.insert(node, Entry { input_type, label });
    }

    pub fn get_or_detect(
        &self,
        engine: &LabelEngine,
        page: &dyn PageView,
        node: NodeId,
    ) -> DetectedLabel {
        if let Some(hit) = self.get(page, node) {
            return hit;
        }
        let detected = engine.detect_with_source(page, node);
        if page.is_connected(node) {
            self.put(page, node, detected.clone());
        }
        detected
    }

    /// Drop every entry whose node is gone. Returns how many were removed.
    pub fn sweep(&self, page: &dyn PageView) -> usize {
        let before = self.entries.len();
        self.entries.retain(|node, _| page.is_connected(*node));
        before - self.entries.len()
    }

    pub fn invalidate(&self, node: NodeId) {
        self.entries.remove(&node);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}
