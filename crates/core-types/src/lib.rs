//! Shared primitives for the SoulReplay capture/replay engine.
//!
//! Everything here is plain data: node handles issued by a host document,
//! the captured `LocatorBundle`, and the `Step` that pairs a bundle with the
//! interaction to replay.

mod bundle;
mod geometry;
mod step;

use std::fmt;

use uuid::Uuid;

pub use bundle::{BoundaryHop, BoundaryKind, BundleError, LocatorBundle};
pub use geometry::{Point, Rect};
pub use step::{EventKind, Step};

/// Opaque handle for a node inside a host document.
///
/// Handles are issued by the host and stay stable for as long as the node is
/// reachable; they are never reused for a different node.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// A query scope: the top-level document, an iframe document, or a shadow root.
///
/// The wrapped handle is the scope's root node.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Scope(pub NodeId);

impl Scope {
    pub fn root(&self) -> NodeId {
        self.0
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scope({})", self.0)
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ActionId(pub String);

impl ActionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for ActionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_and_scope_display() {
        let node = NodeId(7);
        assert_eq!(node.to_string(), "node#7");
        assert_eq!(Scope(node).to_string(), "scope(node#7)");
        assert_eq!(Scope(node).root(), node);
    }

    #[test]
    fn action_ids_are_unique() {
        assert_ne!(ActionId::new(), ActionId::new());
    }
}
