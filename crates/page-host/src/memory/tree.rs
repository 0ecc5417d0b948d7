use std::collections::BTreeMap;

use soulreplay_core_types::{NodeId, Rect, Scope};

use super::fixture::{NodeSpec, StyleSpec};

/// Height of the synthetic layout rows handed to nodes without an explicit rect.
const AUTO_ROW_HEIGHT: f64 = 32.0;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum NodeKind {
    Document,
    ShadowRoot,
    Element,
}

#[derive(Clone, Debug)]
pub(crate) struct NodeData {
    pub kind: NodeKind,
    pub tag: String,
    pub attrs: BTreeMap<String, String>,
    pub text: String,
    pub style: StyleSpec,
    pub rect: Option<Rect>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Iframe document or shadow root hosted by this element
    pub inner: Option<NodeId>,
    /// Host element of a document/shadow root node
    pub host: Option<NodeId>,
    pub connected: bool,
    pub value: Option<String>,
    pub checked: Option<bool>,
    pub prevent_enter: bool,
}

impl NodeData {
    fn root(kind: NodeKind, host: Option<NodeId>) -> Self {
        let tag = match kind {
            NodeKind::Document => "#document",
            NodeKind::ShadowRoot => "#shadow-root",
            NodeKind::Element => "",
        };
        Self {
            kind,
            tag: tag.to_string(),
            attrs: BTreeMap::new(),
            text: String::new(),
            style: StyleSpec::default(),
            rect: None,
            parent: None,
            children: Vec::new(),
            inner: None,
            host,
            connected: true,
            value: None,
            checked: None,
            prevent_enter: false,
        }
    }

    pub fn is_root(&self) -> bool {
        self.kind != NodeKind::Element
    }
}

/// Arena holding every node ever created; handles are indices and are never reused.
#[derive(Clone, Debug)]
pub(crate) struct Tree {
    pub nodes: Vec<NodeData>,
    pub document: NodeId,
    pub url: Option<String>,
    pub focused: Option<NodeId>,
}

impl Tree {
    pub fn new(url: Option<String>) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            document: NodeId(0),
            url,
            focused: None,
        };
        tree.document = tree.push(NodeData::root(NodeKind::Document, None));
        tree
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u64);
        self.nodes.push(data);
        id
    }

    pub fn get(&self, node: NodeId) -> Option<&NodeData> {
        self.nodes.get(node.0 as usize)
    }

    pub fn get_mut(&mut self, node: NodeId) -> Option<&mut NodeData> {
        self.nodes.get_mut(node.0 as usize)
    }

    pub fn element(&self, node: NodeId) -> Option<&NodeData> {
        self.get(node).filter(|data| !data.is_root())
    }

    /// Build `html > body > children` under a document root.
    pub fn populate_document(&mut self, doc: NodeId, body_children: &[NodeSpec]) -> NodeId {
        let html = self.insert(doc, &NodeSpec::new("html"));
        let body = self.insert(html, &NodeSpec::new("body"));
        for child in body_children {
            self.insert(body, child);
        }
        body
    }

    /// Insert `spec` (and its subtree) as the last child of `parent`.
    pub fn insert(&mut self, parent: NodeId, spec: &NodeSpec) -> NodeId {
        let mut attrs = BTreeMap::new();
        for (name, value) in &spec.attrs {
            attrs.insert(name.to_ascii_lowercase(), value.clone());
        }
        let value = spec.value.clone();
        let data = NodeData {
            kind: NodeKind::Element,
            tag: spec.tag.to_ascii_lowercase(),
            attrs,
            text: spec.text.clone().unwrap_or_default(),
            style: spec.style,
            rect: spec.rect,
            parent: Some(parent),
            children: Vec::new(),
            inner: None,
            host: None,
            connected: true,
            value,
            checked: spec.checked,
            prevent_enter: spec.prevent_enter,
        };
        let id = self.push(data);
        if let Some(parent_data) = self.get_mut(parent) {
            parent_data.children.push(id);
        }

        for child in &spec.children {
            self.insert(id, child);
        }
        if let Some(shadow) = &spec.shadow {
            let root = self.push(NodeData::root(NodeKind::ShadowRoot, Some(id)));
            if let Some(host) = self.get_mut(id) {
                host.inner = Some(root);
            }
            for child in shadow {
                self.insert(root, child);
            }
        } else if let Some(frame) = &spec.frame {
            let doc = self.push(NodeData::root(NodeKind::Document, Some(id)));
            if let Some(host) = self.get_mut(id) {
                host.inner = Some(doc);
            }
            self.populate_document(doc, frame);
        }
        id
    }

    /// Detach `node` from its parent and mark the whole subtree disconnected.
    pub fn detach(&mut self, node: NodeId) -> bool {
        let parent = match self.element(node) {
            Some(data) if data.connected => data.parent,
            _ => return false,
        };
        if let Some(parent) = parent.and_then(|p| self.get_mut(p)) {
            parent.children.retain(|c| *c != node);
        }
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if let Some(data) = self.get_mut(current) {
                data.connected = false;
                stack.extend(data.children.iter().copied());
                if let Some(inner) = data.inner {
                    stack.push(inner);
                }
            }
        }
        if self.focused.map(|f| !self.is_connected(f)).unwrap_or(false) {
            self.focused = None;
        }
        true
    }

    pub fn is_connected(&self, node: NodeId) -> bool {
        self.get(node).map(|d| d.connected).unwrap_or(false)
    }

    /// Root node (document or shadow root) owning `node`.
    pub fn scope_root(&self, node: NodeId) -> Option<NodeId> {
        let mut current = node;
        loop {
            let data = self.get(current)?;
            if data.is_root() {
                return Some(current);
            }
            current = data.parent?;
        }
    }

    /// Element parent; `None` when the parent is a scope root.
    pub fn element_parent(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.element(node)?.parent?;
        self.element(parent).map(|_| parent)
    }

    /// Elements under `root` in document order, not crossing boundaries.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = match self.get(root) {
            Some(data) => data.children.iter().rev().copied().collect(),
            None => return out,
        };
        while let Some(current) = stack.pop() {
            if let Some(data) = self.get(current) {
                out.push(current);
                stack.extend(data.children.iter().rev().copied());
            }
        }
        out
    }

    /// Visibility folded over ancestors, including enclosing boundary hosts.
    pub fn effective_style(&self, node: NodeId) -> (StyleSpec, bool) {
        let mut style = StyleSpec::default();
        let mut opacity = 1.0;
        let mut hidden_attr = false;
        let mut current = Some(node);
        while let Some(id) = current {
            let Some(data) = self.get(id) else { break };
            if data.is_root() {
                current = data.host;
                continue;
            }
            style.display_none |= data.style.display_none;
            style.visibility_hidden |= data.style.visibility_hidden;
            opacity *= data.style.opacity.unwrap_or(1.0);
            hidden_attr |= data.attrs.contains_key("hidden");
            current = data.parent;
        }
        style.opacity = Some(opacity);
        (style, hidden_attr)
    }

    pub fn rect_of(&self, node: NodeId) -> Option<Rect> {
        let data = self.element(node)?;
        if !data.connected {
            return None;
        }
        let (style, _) = self.effective_style(node);
        if style.display_none {
            return Some(Rect::default());
        }
        Some(data.rect.unwrap_or_else(|| {
            Rect::new(0.0, node.0 as f64 * AUTO_ROW_HEIGHT, 200.0, AUTO_ROW_HEIGHT - 8.0)
        }))
    }

    /// First element in any scope, document order, carrying `id`.
    pub fn find_by_id(&self, id: &str) -> Option<NodeId> {
        let mut scopes = vec![self.document];
        while let Some(root) = scopes.pop() {
            for node in self.descendants(root) {
                let Some(data) = self.get(node) else { continue };
                if data.attrs.get("id").map(|v| v == id).unwrap_or(false) {
                    return Some(node);
                }
                if let Some(inner) = data.inner {
                    scopes.push(inner);
                }
            }
        }
        None
    }

    pub fn element_by_id_in(&self, root: NodeId, id: &str) -> Option<NodeId> {
        self.descendants(root).into_iter().find(|node| {
            self.get(*node)
                .and_then(|d| d.attrs.get("id"))
                .map(|v| v == id)
                .unwrap_or(false)
        })
    }

    pub fn body(&self) -> Option<NodeId> {
        self.descendants(self.document)
            .into_iter()
            .find(|node| self.get(*node).map(|d| d.tag == "body").unwrap_or(false))
    }
}
