//! In-memory document host.
//!
//! `MemoryPage` implements every port over an arena tree built from a
//! [`PageFixture`]. It understands a CSS subset and absolute positional XPath,
//! records every dispatched interaction, and emits mutation notices when
//! the tree is edited.

mod fixture;
mod selector;
mod tree;
mod xpath;

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use soulreplay_core_types::{BoundaryKind, NodeId, Point, Rect, Scope};
use tokio::sync::broadcast;
use tracing::debug;

pub use fixture::{NodeSpec, PageFixture, StyleSpec};

use self::selector::CssSelector;
use self::tree::{NodeKind, Tree};
use crate::errors::HostError;
use crate::ports::{
    ControlState, ControlValue, DispatchOutcome, DocumentAccessor, EventDispatcher, EventName,
    MutationNotice, MutationStream, NodeInspector, Selector, SyntheticEvent, Visibility,
};

const NOTICE_CAPACITY: usize = 256;

/// Side effect observed by the in-memory host.
#[derive(Clone, Debug, PartialEq)]
pub enum HostRecord {
    Event {
        node: NodeId,
        name: EventName,
        point: Option<Point>,
        key: Option<String>,
    },
    Focus(NodeId),
    ValueSet {
        node: NodeId,
        value: ControlValue,
    },
    Submit {
        form: NodeId,
    },
    Navigate(String),
}

pub struct MemoryPage {
    tree: RwLock<Tree>,
    records: Mutex<Vec<HostRecord>>,
    notices: broadcast::Sender<MutationNotice>,
}

impl MemoryPage {
    pub fn from_fixture(fixture: &PageFixture) -> Self {
        let mut tree = Tree::new(fixture.url.clone());
        let doc = tree.document;
        tree.populate_document(doc, &fixture.body);
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        Self {
            tree: RwLock::new(tree),
            records: Mutex::new(Vec::new()),
            notices,
        }
    }

    pub fn with_body(url: impl Into<String>, body: impl IntoIterator<Item = NodeSpec>) -> Self {
        let fixture = PageFixture {
            url: Some(url.into()),
            body: body.into_iter().collect(),
        };
        Self::from_fixture(&fixture)
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::from_fixture(&PageFixture::from_json(raw)?))
    }

    pub fn body(&self) -> Option<NodeId> {
        self.tree.read().body()
    }

    /// First element carrying `id`, searching nested frames and shadow roots.
    pub fn find_by_id(&self, id: &str) -> Option<NodeId> {
        self.tree.read().find_by_id(id)
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.tree.read().focused
    }

    pub fn records(&self) -> Vec<HostRecord> {
        self.records.lock().clone()
    }

    pub fn clear_records(&self) {
        self.records.lock().clear();
    }

    /// Events dispatched to `node`, in order.
    pub fn events_for(&self, node: NodeId) -> Vec<EventName> {
        self.records
            .lock()
            .iter()
            .filter_map(|record| match record {
                HostRecord::Event { node: n, name, .. } if *n == node => Some(*name),
                _ => None,
            })
            .collect()
    }

    /// Append `spec` under `parent` and notify subscribers of the parent's scope.
    pub fn append_child(&self, parent: NodeId, spec: NodeSpec) -> Result<NodeId, HostError> {
        let (node, scope) = {
            let mut tree = self.tree.write();
            if !tree.is_connected(parent) {
                return Err(HostError::Detached(parent));
            }
            let node = tree.insert(parent, &spec);
            let scope = tree.scope_root(parent).map(Scope);
            (node, scope)
        };
        if let Some(scope) = scope {
            self.notify(MutationNotice {
                scope,
                added: vec![node],
                removed: Vec::new(),
            });
        }
        Ok(node)
    }

    pub fn remove(&self, node: NodeId) -> Result<(), HostError> {
        let scope = {
            let mut tree = self.tree.write();
            let scope = tree.scope_root(node).map(Scope);
            if !tree.detach(node) {
                return Err(HostError::Detached(node));
            }
            scope
        };
        if let Some(scope) = scope {
            self.notify(MutationNotice {
                scope,
                added: Vec::new(),
                removed: vec![node],
            });
        }
        Ok(())
    }

    pub fn set_attribute(
        &self,
        node: NodeId,
        name: &str,
        value: impl Into<String>,
    ) -> Result<(), HostError> {
        self.edit(node, |data| {
            data.attrs.insert(name.to_ascii_lowercase(), value.into());
        })
    }

    pub fn remove_attribute(&self, node: NodeId, name: &str) -> Result<(), HostError> {
        self.edit(node, |data| {
            data.attrs.remove(&name.to_ascii_lowercase());
        })
    }

    pub fn set_style(&self, node: NodeId, style: StyleSpec) -> Result<(), HostError> {
        self.edit(node, |data| data.style = style)
    }

    pub fn set_rect(&self, node: NodeId, rect: Rect) -> Result<(), HostError> {
        self.edit(node, |data| data.rect = Some(rect))
    }

    pub fn set_text(&self, node: NodeId, text: impl Into<String>) -> Result<(), HostError> {
        self.edit(node, |data| data.text = text.into())
    }

    fn edit(
        &self,
        node: NodeId,
        apply: impl FnOnce(&mut tree::NodeData),
    ) -> Result<(), HostError> {
        let mut tree = self.tree.write();
        match tree.get_mut(node) {
            Some(data) if data.connected && data.kind == NodeKind::Element => {
                apply(data);
                Ok(())
            }
            _ => Err(HostError::Detached(node)),
        }
    }

    fn notify(&self, notice: MutationNotice) {
        // No subscribers is fine.
        let _ = self.notices.send(notice);
    }

    fn record(&self, record: HostRecord) {
        self.records.lock().push(record);
    }

    /// Shared guard for interactions: live element, not disabled.
    fn interactive(&self, node: NodeId) -> Result<(), HostError> {
        let tree = self.tree.read();
        match tree.element(node) {
            Some(data) if data.connected => {
                if data.attrs.contains_key("disabled") {
                    Err(HostError::Rejected(format!("{} is disabled", node)))
                } else {
                    Ok(())
                }
            }
            _ => Err(HostError::Detached(node)),
        }
    }

    fn enclosing_form(&self, node: NodeId) -> Option<NodeId> {
        let tree = self.tree.read();
        let mut current = tree.element_parent(node);
        while let Some(id) = current {
            if tree.element(id).map(|d| d.tag == "form").unwrap_or(false) {
                return Some(id);
            }
            current = tree.element_parent(id);
        }
        None
    }
}

impl NodeInspector for MemoryPage {
    fn tag_name(&self, node: NodeId) -> Option<String> {
        self.tree.read().element(node).map(|d| d.tag.clone())
    }

    fn attributes(&self, node: NodeId) -> BTreeMap<String, String> {
        self.tree
            .read()
            .element(node)
            .map(|d| d.attrs.clone())
            .unwrap_or_default()
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.tree
            .read()
            .element(node)
            .and_then(|d| d.attrs.get(name).cloned())
    }

    fn visibility(&self, node: NodeId) -> Visibility {
        let tree = self.tree.read();
        let (style, hidden_attr) = tree.effective_style(node);
        Visibility {
            display_none: style.display_none,
            visibility_hidden: style.visibility_hidden,
            hidden_attr,
            opacity: style.opacity.unwrap_or(1.0),
        }
    }

    fn bounding_rect(&self, node: NodeId) -> Option<Rect> {
        self.tree.read().rect_of(node)
    }

    fn own_text(&self, node: NodeId) -> String {
        self.tree
            .read()
            .element(node)
            .map(|d| d.text.clone())
            .unwrap_or_default()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.tree.read().element_parent(node)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        let tree = self.tree.read();
        tree.get(node)
            .map(|d| {
                d.children
                    .iter()
                    .copied()
                    .filter(|c| tree.element(*c).is_some())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn is_connected(&self, node: NodeId) -> bool {
        self.tree.read().is_connected(node)
    }

    fn resolve_id_refs(&self, node: NodeId, ids: &str) -> Vec<NodeId> {
        let tree = self.tree.read();
        let Some(root) = tree.scope_root(node) else {
            return Vec::new();
        };
        ids.split_whitespace()
            .filter_map(|id| tree.element_by_id_in(root, id))
            .collect()
    }

    fn control_state(&self, node: NodeId) -> ControlState {
        let tree = self.tree.read();
        let Some(data) = tree.element(node) else {
            return ControlState::default();
        };
        let checkable = data.tag == "input"
            && matches!(
                data.attrs.get("type").map(|t| t.to_ascii_lowercase()).as_deref(),
                Some("checkbox" | "radio")
            );
        ControlState {
            value: data.value.clone().or_else(|| data.attrs.get("value").cloned()),
            checked: if checkable {
                Some(data.checked.unwrap_or_else(|| data.attrs.contains_key("checked")))
            } else {
                None
            },
            disabled: data.attrs.contains_key("disabled"),
        }
    }
}

impl DocumentAccessor for MemoryPage {
    fn document(&self) -> Scope {
        Scope(self.tree.read().document)
    }

    fn query(&self, selector: &Selector, scope: Scope) -> Result<Vec<NodeId>, HostError> {
        let tree = self.tree.read();
        match tree.get(scope.root()) {
            Some(root) if root.is_root() && root.connected => {}
            _ => return Err(HostError::Detached(scope.root())),
        }
        let found = match selector {
            Selector::Css(css) => {
                let parsed = CssSelector::parse(css)?;
                tree.descendants(scope.root())
                    .into_iter()
                    .filter(|node| parsed.matches(&tree, *node))
                    .collect()
            }
            Selector::XPath(path) => xpath::evaluate(&tree, scope.root(), path)?,
        };
        debug!(%selector, %scope, hits = found.len(), "memory query");
        Ok(found)
    }

    fn scope_of(&self, node: NodeId) -> Option<Scope> {
        self.tree.read().scope_root(node).map(Scope)
    }

    fn boundary_host(&self, scope: Scope) -> Option<(BoundaryKind, NodeId)> {
        let tree = self.tree.read();
        let root = tree.get(scope.root())?;
        let host = root.host?;
        let kind = match root.kind {
            NodeKind::Document => BoundaryKind::Iframe,
            NodeKind::ShadowRoot => BoundaryKind::ShadowHost,
            NodeKind::Element => return None,
        };
        Some((kind, host))
    }

    fn enter_boundary(&self, host: NodeId) -> Option<(BoundaryKind, Scope)> {
        let tree = self.tree.read();
        let data = tree.element(host)?;
        if !data.connected {
            return None;
        }
        let inner = data.inner?;
        let kind = match tree.get(inner)?.kind {
            NodeKind::Document => BoundaryKind::Iframe,
            NodeKind::ShadowRoot => BoundaryKind::ShadowHost,
            NodeKind::Element => return None,
        };
        Some((kind, Scope(inner)))
    }

    fn current_url(&self) -> Option<String> {
        self.tree.read().url.clone()
    }

    fn subscribe_mutations(&self, scope: Scope) -> MutationStream {
        MutationStream::new(scope, self.notices.subscribe())
    }
}

#[async_trait]
impl EventDispatcher for MemoryPage {
    async fn dispatch(
        &self,
        node: NodeId,
        event: SyntheticEvent,
    ) -> Result<DispatchOutcome, HostError> {
        self.interactive(node)?;
        let is_enter = event.name == EventName::KeyDown && event.key.as_deref() == Some("Enter");
        self.record(HostRecord::Event {
            node,
            name: event.name,
            point: event.point,
            key: event.key.clone(),
        });

        if !is_enter {
            return Ok(DispatchOutcome::default());
        }
        let prevented = self
            .tree
            .read()
            .element(node)
            .map(|d| d.prevent_enter)
            .unwrap_or(false);
        if prevented {
            return Ok(DispatchOutcome {
                default_prevented: true,
            });
        }
        if let Some(form) = self.enclosing_form(node) {
            self.record(HostRecord::Submit { form });
        }
        Ok(DispatchOutcome::default())
    }

    async fn focus(&self, node: NodeId) -> Result<(), HostError> {
        self.interactive(node)?;
        self.tree.write().focused = Some(node);
        self.record(HostRecord::Focus(node));
        Ok(())
    }

    async fn set_controlled_value(
        &self,
        node: NodeId,
        value: &ControlValue,
    ) -> Result<(), HostError> {
        self.interactive(node)?;
        {
            let mut tree = self.tree.write();
            let Some(data) = tree.get_mut(node) else {
                return Err(HostError::Detached(node));
            };
            if data.attrs.contains_key("readonly") {
                return Err(HostError::Rejected(format!("{} is read-only", node)));
            }
            match value {
                ControlValue::Text(text) | ControlValue::Selected(text) => {
                    data.value = Some(text.clone())
                }
                ControlValue::Checked(checked) => data.checked = Some(*checked),
            }
        }
        self.record(HostRecord::ValueSet {
            node,
            value: value.clone(),
        });
        Ok(())
    }

    async fn navigate(&self, url: &str) -> Result<(), HostError> {
        self.tree.write().url = Some(url.to_string());
        self.record(HostRecord::Navigate(url.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn login_page() -> MemoryPage {
        MemoryPage::with_body(
            "https://example.test/login",
            [
                NodeSpec::new("form").id("login").children([
                    NodeSpec::new("label").attr("for", "email").text("Email"),
                    NodeSpec::new("input").id("email").attr("type", "email"),
                    NodeSpec::new("input")
                        .id("locked")
                        .attr("disabled", "")
                        .attr("type", "text"),
                ]),
                NodeSpec::new("div")
                    .id("widget")
                    .shadow([NodeSpec::new("button").id("inner-btn").text("Go")]),
                NodeSpec::new("iframe")
                    .id("frame")
                    .frame([NodeSpec::new("input").id("card")]),
            ],
        )
    }

    #[test]
    fn scopes_and_boundaries() {
        let page = login_page();
        let doc = page.document();
        let inner = page.find_by_id("inner-btn").unwrap();
        let card = page.find_by_id("card").unwrap();
        let widget = page.find_by_id("widget").unwrap();
        let frame = page.find_by_id("frame").unwrap();

        let shadow_scope = page.scope_of(inner).unwrap();
        assert_ne!(shadow_scope, doc);
        assert_eq!(
            page.boundary_host(shadow_scope),
            Some((BoundaryKind::ShadowHost, widget))
        );
        assert_eq!(
            page.enter_boundary(frame).map(|(k, _)| k),
            Some(BoundaryKind::Iframe)
        );
        assert_eq!(page.boundary_host(page.scope_of(card).unwrap()).unwrap().1, frame);
        assert_eq!(page.boundary_host(doc), None);
    }

    #[test]
    fn queries_do_not_pierce_boundaries() {
        let page = login_page();
        let doc = page.document();
        let buttons = page.query(&Selector::css("button"), doc).unwrap();
        assert!(buttons.is_empty());
        let inputs = page.query(&Selector::css("input"), doc).unwrap();
        assert_eq!(inputs.len(), 2);

        let frame = page.find_by_id("frame").unwrap();
        let (_, frame_scope) = page.enter_boundary(frame).unwrap();
        let hit = page
            .query(&Selector::xpath("/html[1]/body[1]/input[1]"), frame_scope)
            .unwrap();
        assert_eq!(hit, vec![page.find_by_id("card").unwrap()]);
    }

    #[test]
    fn hidden_ancestor_hides_and_zeroes_rect() {
        let page = MemoryPage::with_body(
            "https://example.test/",
            [NodeSpec::new("div")
                .display_none()
                .child(NodeSpec::new("span").id("x").text("secret"))],
        );
        let span = page.find_by_id("x").unwrap();
        assert!(page.visibility(span).is_hidden());
        assert!(page.bounding_rect(span).unwrap().is_empty());
        let body = page.body().unwrap();
        assert_eq!(page.text_content(body), "");
    }

    #[tokio::test]
    async fn disabled_controls_reject_interaction() {
        let page = login_page();
        let locked = page.find_by_id("locked").unwrap();
        let err = page.focus(locked).await.unwrap_err();
        assert!(matches!(err, HostError::Rejected(_)));
        let err = page
            .set_controlled_value(locked, &ControlValue::Text("x".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, HostError::Rejected(_)));
    }

    #[tokio::test]
    async fn enter_submits_enclosing_form() {
        let page = login_page();
        let email = page.find_by_id("email").unwrap();
        let form = page.find_by_id("login").unwrap();
        page.dispatch(
            email,
            SyntheticEvent::new(EventName::KeyDown).with_key("Enter"),
        )
        .await
        .unwrap();
        assert!(page.records().contains(&HostRecord::Submit { form }));
    }

    #[tokio::test]
    async fn removed_nodes_are_detached() {
        let page = login_page();
        let email = page.find_by_id("email").unwrap();
        let mut stream = page.subscribe_mutations(page.document());
        page.remove(email).unwrap();
        assert!(!page.is_connected(email));
        let err = page.focus(email).await.unwrap_err();
        assert_eq!(err, HostError::Detached(email));
        let notice = stream.try_next().unwrap();
        assert_eq!(notice.removed, vec![email]);
    }

    #[test]
    fn id_refs_resolve_in_order() {
        let page = MemoryPage::with_body(
            "https://example.test/",
            [
                NodeSpec::new("span").id("first").text("Billing"),
                NodeSpec::new("span").id("second").text("Address"),
                NodeSpec::new("input").id("field"),
            ],
        );
        let field = page.find_by_id("field").unwrap();
        let refs = page.resolve_id_refs(field, "second missing first");
        assert_eq!(
            refs,
            vec![
                page.find_by_id("second").unwrap(),
                page.find_by_id("first").unwrap()
            ]
        );
    }
}
