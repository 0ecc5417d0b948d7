//! Capability ports a hosting environment must provide.
//!
//! The engine never touches a real document directly. Capture reads through
//! [`NodeInspector`] and [`DocumentAccessor`], replay additionally drives an
//! [`EventDispatcher`], and every timer goes through a [`Clock`].

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use bitflags::bitflags;
use soulreplay_core_types::{BoundaryKind, NodeId, Point, Rect, Scope};
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::errors::HostError;

/// Nesting limit for text collection; hosts are cooperative and deep walks stall the page.
pub const MAX_TEXT_DEPTH: usize = 64;

/// Query understood by [`DocumentAccessor::query`].
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Selector {
    Css(String),
    XPath(String),
}

impl Selector {
    pub fn css(selector: impl Into<String>) -> Self {
        Selector::Css(selector.into())
    }

    pub fn xpath(path: impl Into<String>) -> Self {
        Selector::XPath(path.into())
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Css(s) => write!(f, "css:{}", s),
            Selector::XPath(s) => write!(f, "xpath:{}", s),
        }
    }
}

/// Computed visibility of a node, already folded over its ancestors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Visibility {
    pub display_none: bool,
    pub visibility_hidden: bool,
    pub hidden_attr: bool,
    pub opacity: f64,
}

impl Default for Visibility {
    fn default() -> Self {
        Self {
            display_none: false,
            visibility_hidden: false,
            hidden_attr: false,
            opacity: 1.0,
        }
    }
}

impl Visibility {
    pub fn is_hidden(&self) -> bool {
        self.display_none || self.visibility_hidden || self.hidden_attr || self.opacity <= 0.0
    }
}

/// Live state of a form control.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ControlState {
    pub value: Option<String>,
    pub checked: Option<bool>,
    pub disabled: bool,
}

/// Read access to individual nodes.
pub trait NodeInspector: Send + Sync {
    /// Lower-case tag name, `None` for unknown handles.
    fn tag_name(&self, node: NodeId) -> Option<String>;

    fn attributes(&self, node: NodeId) -> BTreeMap<String, String>;

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.attributes(node).remove(name)
    }

    fn class_list(&self, node: NodeId) -> Vec<String> {
        let mut classes: Vec<String> = Vec::new();
        if let Some(raw) = self.attribute(node, "class") {
            for class in raw.split_whitespace() {
                if !classes.iter().any(|c| c == class) {
                    classes.push(class.to_string());
                }
            }
        }
        classes
    }

    fn visibility(&self, node: NodeId) -> Visibility;

    /// Live bounding rectangle; zero-sized for nodes that are not rendered.
    fn bounding_rect(&self, node: NodeId) -> Option<Rect>;

    /// Text owned directly by the node (its text-node children).
    fn own_text(&self, node: NodeId) -> String;

    /// Rendered text of the subtree with hidden descendants left out.
    fn text_content(&self, node: NodeId) -> String {
        collect_text(self, node, None)
    }

    /// Parent element within the same scope; `None` at a scope root.
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Element children in document order.
    fn children(&self, node: NodeId) -> Vec<NodeId>;

    fn is_connected(&self, node: NodeId) -> bool;

    /// Resolve a whitespace-separated id reference list in the node's scope,
    /// preserving list order and skipping unknown ids.
    fn resolve_id_refs(&self, node: NodeId, ids: &str) -> Vec<NodeId>;

    fn control_state(&self, node: NodeId) -> ControlState;
}

/// Structural mutation under one scope.
#[derive(Clone, Debug, PartialEq)]
pub struct MutationNotice {
    pub scope: Scope,
    pub added: Vec<NodeId>,
    pub removed: Vec<NodeId>,
}

/// Subscription handed out by [`DocumentAccessor::subscribe_mutations`].
pub struct MutationStream {
    scope: Scope,
    rx: broadcast::Receiver<MutationNotice>,
}

impl MutationStream {
    pub fn new(scope: Scope, rx: broadcast::Receiver<MutationNotice>) -> Self {
        Self { scope, rx }
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Next notice for this scope; `None` once the host closed the feed.
    pub async fn next(&mut self) -> Option<MutationNotice> {
        loop {
            match self.rx.recv().await {
                Ok(notice) if notice.scope == self.scope => return Some(notice),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(scope = %self.scope, skipped, "mutation stream lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking variant of [`MutationStream::next`].
    pub fn try_next(&mut self) -> Option<MutationNotice> {
        loop {
            match self.rx.try_recv() {
                Ok(notice) if notice.scope == self.scope => return Some(notice),
                Ok(_) => continue,
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(scope = %self.scope, skipped, "mutation stream lagged");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }
}

/// Document-level queries and boundary traversal.
pub trait DocumentAccessor: Send + Sync {
    /// Scope of the top-level document.
    fn document(&self) -> Scope;

    /// Matching nodes in document order. Queries never pierce nested
    /// iframe documents or shadow roots.
    fn query(&self, selector: &Selector, scope: Scope) -> Result<Vec<NodeId>, HostError>;

    fn scope_of(&self, node: NodeId) -> Option<Scope>;

    /// Element hosting `scope` (iframe or shadow host); `None` for the document.
    fn boundary_host(&self, scope: Scope) -> Option<(BoundaryKind, NodeId)>;

    /// Scope behind a host element, if it currently has one.
    fn enter_boundary(&self, host: NodeId) -> Option<(BoundaryKind, Scope)>;

    fn current_url(&self) -> Option<String>;

    fn subscribe_mutations(&self, scope: Scope) -> MutationStream;
}

/// Read-only page view used at capture and resolution time.
pub trait PageView: DocumentAccessor + NodeInspector {}

impl<T: DocumentAccessor + NodeInspector + ?Sized> PageView for T {}

/// Synthetic interaction names.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum EventName {
    PointerEnter,
    PointerOver,
    PointerDown,
    PointerUp,
    Click,
    Input,
    Change,
    Blur,
    KeyDown,
    KeyUp,
}

impl EventName {
    pub fn name(&self) -> &'static str {
        match self {
            EventName::PointerEnter => "pointerenter",
            EventName::PointerOver => "pointerover",
            EventName::PointerDown => "pointerdown",
            EventName::PointerUp => "pointerup",
            EventName::Click => "click",
            EventName::Input => "input",
            EventName::Change => "change",
            EventName::Blur => "blur",
            EventName::KeyDown => "keydown",
            EventName::KeyUp => "keyup",
        }
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct KeyMod: u8 {
        const CTRL = 0b0001;
        const SHIFT = 0b0010;
        const ALT = 0b0100;
        const META = 0b1000;
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SyntheticEvent {
    pub name: EventName,
    pub point: Option<Point>,
    pub key: Option<String>,
    pub modifiers: KeyMod,
}

impl SyntheticEvent {
    pub fn new(name: EventName) -> Self {
        Self {
            name,
            point: None,
            key: None,
            modifiers: KeyMod::empty(),
        }
    }

    pub fn at(mut self, point: Option<Point>) -> Self {
        self.point = point;
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// A page handler cancelled the default action
    pub default_prevented: bool,
}

/// Value written through [`EventDispatcher::set_controlled_value`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ControlValue {
    Text(String),
    Checked(bool),
    Selected(String),
}

/// Interaction side of the host.
#[async_trait]
pub trait EventDispatcher: Send + Sync {
    async fn dispatch(
        &self,
        node: NodeId,
        event: SyntheticEvent,
    ) -> Result<DispatchOutcome, HostError>;

    async fn focus(&self, node: NodeId) -> Result<(), HostError>;

    /// Write a control's value/checked state through the channel that still
    /// notifies framework-level observers of controlled inputs.
    async fn set_controlled_value(
        &self,
        node: NodeId,
        value: &ControlValue,
    ) -> Result<(), HostError>;

    async fn navigate(&self, url: &str) -> Result<(), HostError>;
}

/// Full host surface needed by replay.
pub trait ReplayHost: PageView + EventDispatcher {}

impl<T: PageView + EventDispatcher + ?Sized> ReplayHost for T {}

/// Handle to a scheduled callback.
#[derive(Clone, Debug)]
pub struct TimerHandle {
    token: CancellationToken,
}

impl TimerHandle {
    pub fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

pub type TimerTask = Box<dyn FnOnce() + Send + 'static>;

/// Time source for debounce, throttle and the resolution poll loop.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;

    async fn sleep(&self, duration: Duration);

    fn schedule(&self, delay: Duration, task: TimerTask) -> TimerHandle;
}

/// Collect rendered text under `node`, skipping hidden subtrees and `exclude`.
pub fn collect_text<I: NodeInspector + ?Sized>(
    inspector: &I,
    node: NodeId,
    exclude: Option<NodeId>,
) -> String {
    let mut parts = Vec::new();
    push_text(inspector, node, exclude, 0, &mut parts);
    parts.join(" ")
}

fn push_text<I: NodeInspector + ?Sized>(
    inspector: &I,
    node: NodeId,
    exclude: Option<NodeId>,
    depth: usize,
    parts: &mut Vec<String>,
) {
    if depth > MAX_TEXT_DEPTH || Some(node) == exclude {
        return;
    }
    let own = inspector.own_text(node);
    let own = own.trim();
    if !own.is_empty() {
        parts.push(own.to_string());
    }
    for child in inspector.children(node) {
        if Some(child) == exclude {
            continue;
        }
        if matches!(
            inspector.tag_name(child).as_deref(),
            Some("script" | "style" | "template" | "title")
        ) {
            continue;
        }
        if inspector.visibility(child).is_hidden() {
            continue;
        }
        push_text(inspector, child, exclude, depth + 1, parts);
    }
}
