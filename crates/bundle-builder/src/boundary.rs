//! Boundary chains (iframe / shadow-host hops) and the incremental index of
//! nested scopes known to a capture session.

use std::sync::Arc;

use dashmap::DashMap;
use page_host::{MutationNotice, PageView, Selector};
use soulreplay_core_types::{BoundaryHop, BoundaryKind, NodeId, Scope};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::css::css_selector;
use crate::policy::BuilderPolicy;
use crate::xpath::positional_xpath;

/// Nodes visited when walking a freshly added subtree for new boundaries.
const MAX_ADDED_SUBTREE: usize = 4_096;

/// Describe a boundary host in the coordinates of its enclosing scope.
pub fn describe_host(
    page: &dyn PageView,
    kind: BoundaryKind,
    host: NodeId,
    policy: &BuilderPolicy,
) -> BoundaryHop {
    let tag = page.tag_name(host).unwrap_or_default();
    let id = page.attribute(host, "id");
    let classes = page.class_list(host);
    BoundaryHop {
        kind,
        host_xpath: positional_xpath(page, host),
        host_selector: css_selector(
            &tag,
            id.as_deref(),
            classes.iter().map(String::as_str),
            policy.max_selector_classes,
        ),
    }
}

/// Hops from the top document down to the scope owning `node`, outermost first.
pub fn boundary_chain(page: &dyn PageView, node: NodeId, policy: &BuilderPolicy) -> Vec<BoundaryHop> {
    let mut hops = Vec::new();
    let mut scope = page.scope_of(node);
    while let Some(current) = scope {
        let Some((kind, host)) = page.boundary_host(current) else {
            break;
        };
        if hops.len() >= policy.max_boundary_depth {
            warn!(%node, depth = hops.len(), "boundary chain truncated at max depth");
            break;
        }
        hops.push(describe_host(page, kind, host, policy));
        scope = page.scope_of(host);
    }
    hops.reverse();
    hops
}

/// A nested scope discovered by the index.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexedScope {
    pub kind: BoundaryKind,
    pub host: NodeId,
    pub parent: Scope,
    pub depth: usize,
    pub hop: BoundaryHop,
}

/// Known iframe/shadow scopes, seeded by a bounded scan and extended from
/// mutation notices instead of re-walking the tree.
pub struct BoundaryIndex {
    document: Scope,
    scopes: DashMap<Scope, IndexedScope>,
    /// Stop signal of the background watcher following each scope
    watchers: DashMap<Scope, CancellationToken>,
    policy: BuilderPolicy,
}

impl BoundaryIndex {
    pub fn new(document: Scope, policy: BuilderPolicy) -> Self {
        Self {
            document,
            scopes: DashMap::new(),
            watchers: DashMap::new(),
            policy,
        }
    }

    /// Index every boundary reachable from the top document.
    pub fn scan(page: &dyn PageView, policy: BuilderPolicy) -> Self {
        let index = Self::new(page.document(), policy);
        index.scan_scope(page, index.document, 0);
        index
    }

    pub fn document(&self) -> Scope {
        self.document
    }

    pub fn contains(&self, scope: Scope) -> bool {
        scope == self.document || self.scopes.contains_key(&scope)
    }

    pub fn get(&self, scope: Scope) -> Option<IndexedScope> {
        self.scopes.get(&scope).map(|entry| entry.value().clone())
    }

    /// Nested scopes currently known, document excluded.
    pub fn scopes(&self) -> Vec<Scope> {
        let mut scopes: Vec<Scope> = self.scopes.iter().map(|e| *e.key()).collect();
        scopes.sort();
        scopes
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Scopes with a live background watcher, document included.
    pub fn watched(&self) -> usize {
        self.watchers.len()
    }

    /// Recorded hops leading into `scope`, outermost first.
    pub fn chain_for(&self, scope: Scope) -> Option<Vec<BoundaryHop>> {
        let mut hops = Vec::new();
        let mut current = scope;
        while current != self.document {
            let entry = self.scopes.get(&current)?;
            hops.push(entry.hop.clone());
            current = entry.parent;
            if hops.len() > self.policy.max_boundary_depth {
                return None;
            }
        }
        hops.reverse();
        Some(hops)
    }

    fn depth_of(&self, scope: Scope) -> usize {
        self.scopes.get(&scope).map(|e| e.depth).unwrap_or(0)
    }

    /// Scan `scope` and everything nested below it. Returns new scopes.
    fn scan_scope(&self, page: &dyn PageView, scope: Scope, depth: usize) -> Vec<Scope> {
        let mut discovered = Vec::new();
        let mut pending = vec![(scope, depth)];
        while let Some((current, depth)) = pending.pop() {
            let elements = match page.query(&Selector::css("*"), current) {
                Ok(elements) => elements,
                Err(err) => {
                    warn!(scope = %current, error = %err, "boundary scan failed");
                    continue;
                }
            };
            for element in elements {
                if let Some(inner) = self.discover(page, element, current, depth) {
                    discovered.push(inner);
                    pending.push((inner, depth + 1));
                }
            }
        }
        discovered
    }

    fn discover(
        &self,
        page: &dyn PageView,
        host: NodeId,
        parent: Scope,
        parent_depth: usize,
    ) -> Option<Scope> {
        let (kind, inner) = page.enter_boundary(host)?;
        if self.scopes.contains_key(&inner) {
            return None;
        }
        let depth = parent_depth + 1;
        if depth > self.policy.max_boundary_depth {
            debug!(%host, depth, "boundary beyond max depth ignored");
            return None;
        }
        let hop = describe_host(page, kind, host, &self.policy);
        self.scopes.insert(
            inner,
            IndexedScope {
                kind,
                host,
                parent,
                depth,
                hop,
            },
        );
        debug!(%host, scope = %inner, ?kind, "boundary indexed");
        Some(inner)
    }

    /// Apply one mutation notice. Returns scopes discovered by it.
    pub fn observe(&self, page: &dyn PageView, notice: &MutationNotice) -> Vec<Scope> {
        if !notice.removed.is_empty() {
            let gone: Vec<Scope> = self
                .scopes
                .iter()
                .filter(|entry| !page.is_connected(entry.host))
                .map(|entry| *entry.key())
                .collect();
            for scope in gone {
                self.scopes.remove(&scope);
                if let Some((_, watcher)) = self.watchers.remove(&scope) {
                    watcher.cancel();
                }
                debug!(%scope, "boundary pruned");
            }
        }

        // Sibling positions under this scope may have shifted.
        for mut entry in self.scopes.iter_mut() {
            if entry.parent == notice.scope {
                let (kind, host) = (entry.kind, entry.host);
                entry.hop = describe_host(page, kind, host, &self.policy);
            }
        }

        if !self.contains(notice.scope) {
            return Vec::new();
        }
        let depth = self.depth_of(notice.scope);
        let mut discovered = Vec::new();
        for added in &notice.added {
            let mut stack = vec![*added];
            let mut visited = 0;
            while let Some(node) = stack.pop() {
                visited += 1;
                if visited > MAX_ADDED_SUBTREE {
                    warn!(scope = %notice.scope, "added subtree too large, boundary walk stopped");
                    break;
                }
                if let Some(inner) = self.discover(page, node, notice.scope, depth) {
                    discovered.push(inner);
                    discovered.extend(self.scan_scope(page, inner, depth + 1));
                }
                stack.extend(page.children(node));
            }
        }
        discovered
    }

    /// Keep the index current in the background until `cancel` fires.
    pub fn spawn_follow<P>(
        self: &Arc<Self>,
        page: Arc<P>,
        cancel: CancellationToken,
    ) -> JoinHandle<()>
    where
        P: PageView + 'static,
    {
        let mut scopes = vec![self.document];
        scopes.extend(self.scopes());
        let root = scopes.remove(0);
        for scope in scopes {
            watch(self.clone(), page.clone(), scope, cancel.clone());
        }
        watch(self.clone(), page, root, cancel)
    }
}

fn watch<P>(
    index: Arc<BoundaryIndex>,
    page: Arc<P>,
    scope: Scope,
    cancel: CancellationToken,
) -> JoinHandle<()>
where
    P: PageView + 'static,
{
    // Subscribe before spawning so nothing between now and the first poll is missed.
    let mut stream = page.subscribe_mutations(scope);
    let stop = cancel.child_token();
    index.watchers.insert(scope, stop.clone());
    if !index.contains(scope) {
        // Pruned before its watcher was registered.
        stop.cancel();
    }
    tokio::spawn(async move {
        if scope != index.document {
            // Catch anything added between discovery and subscription.
            let depth = index.depth_of(scope);
            for inner in index.scan_scope(page.as_ref(), scope, depth) {
                watch(index.clone(), page.clone(), inner, cancel.clone());
            }
        }
        loop {
            tokio::select! {
                _ = stop.cancelled() => break,
                next = stream.next() => {
                    let Some(notice) = next else { break };
                    for inner in index.observe(page.as_ref(), &notice) {
                        watch(index.clone(), page.clone(), inner, cancel.clone());
                    }
                    if !index.contains(scope) {
                        debug!(%scope, "scope left the index, watcher stopping");
                        break;
                    }
                }
            }
        }
        index.watchers.remove(&scope);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use page_host::{DocumentAccessor, MemoryPage, NodeSpec};

    fn nested_page() -> MemoryPage {
        MemoryPage::with_body(
            "https://example.test/",
            [
                NodeSpec::new("div"),
                NodeSpec::new("iframe").id("outer").frame([NodeSpec::new("div")
                    .attr("class", "card widget")
                    .shadow([NodeSpec::new("input").id("deep")])]),
            ],
        )
    }

    #[test]
    fn chain_lists_outermost_first() {
        let page = nested_page();
        let deep = page.find_by_id("deep").unwrap();
        let chain = boundary_chain(&page, deep, &BuilderPolicy::default());
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[0].kind, BoundaryKind::Iframe);
        assert_eq!(chain[0].host_xpath, "/html[1]/body[1]/iframe[1]");
        assert_eq!(chain[0].host_selector.as_deref(), Some("iframe#outer"));
        assert_eq!(chain[1].kind, BoundaryKind::ShadowHost);
        assert_eq!(chain[1].host_xpath, "/html[1]/body[1]/div[1]");
        assert_eq!(chain[1].host_selector.as_deref(), Some("div.card.widget"));
    }

    #[test]
    fn chain_depth_is_bounded() {
        let page = nested_page();
        let deep = page.find_by_id("deep").unwrap();
        let policy = BuilderPolicy {
            max_boundary_depth: 1,
            ..BuilderPolicy::default()
        };
        assert_eq!(boundary_chain(&page, deep, &policy).len(), 1);
    }

    #[test]
    fn scan_matches_direct_chain() {
        let page = nested_page();
        let index = BoundaryIndex::scan(&page, BuilderPolicy::default());
        assert_eq!(index.len(), 2);
        let deep = page.find_by_id("deep").unwrap();
        let scope = page.scope_of(deep).unwrap();
        assert_eq!(
            index.chain_for(scope),
            Some(boundary_chain(&page, deep, &BuilderPolicy::default()))
        );
        assert_eq!(index.chain_for(page.document()), Some(Vec::new()));
    }

    #[test]
    fn observe_extends_and_prunes() {
        let page = nested_page();
        let index = BoundaryIndex::scan(&page, BuilderPolicy::default());
        let mut stream = page.subscribe_mutations(page.document());
        let body = page.body().unwrap();

        let added = page
            .append_child(
                body,
                NodeSpec::new("section").child(
                    NodeSpec::new("iframe")
                        .id("late")
                        .frame([NodeSpec::new("p")]),
                ),
            )
            .unwrap();
        let notice = stream.try_next().unwrap();
        let found = index.observe(&page, &notice);
        assert_eq!(found.len(), 1);
        assert_eq!(index.len(), 3);

        page.remove(added).unwrap();
        let notice = stream.try_next().unwrap();
        index.observe(&page, &notice);
        assert_eq!(index.len(), 2);
    }
}
