//! Raw interactions reported by the host while recording.

use serde::{Deserialize, Serialize};
use soulreplay_core_types::{EventKind, NodeId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RawInteraction {
    Click { node: NodeId },
    /// Current value of a control after one keystroke or change
    Keystroke { node: NodeId, value: String },
    EnterKey { node: NodeId },
    Navigation { url: String },
}

impl RawInteraction {
    pub fn kind(&self) -> EventKind {
        match self {
            RawInteraction::Click { .. } => EventKind::Click,
            RawInteraction::Keystroke { .. } => EventKind::Input,
            RawInteraction::EnterKey { .. } => EventKind::Enter,
            RawInteraction::Navigation { .. } => EventKind::Navigate,
        }
    }

    pub fn node(&self) -> Option<NodeId> {
        match self {
            RawInteraction::Click { node }
            | RawInteraction::Keystroke { node, .. }
            | RawInteraction::EnterKey { node } => Some(*node),
            RawInteraction::Navigation { .. } => None,
        }
    }
}

/// What the session did with an interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// A step was emitted right away
    Emitted,
    /// Held back until the input goes quiet
    Debounced,
    /// Inside the throttle window of an earlier event of the same kind
    Throttled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_shape() {
        let raw: RawInteraction =
            serde_json::from_str(r#"{"type":"keystroke","node":7,"value":"ab"}"#).unwrap();
        assert_eq!(raw.kind(), EventKind::Input);
        assert_eq!(raw.node(), Some(NodeId(7)));
        let nav: RawInteraction =
            serde_json::from_str(r#"{"type":"navigation","url":"https://example.test/"}"#).unwrap();
        assert_eq!(nav.node(), None);
    }
}
