//! Re-entering the scope a bundle was captured in.

use page_host::{PageView, Selector};
use soulreplay_core_types::{BoundaryHop, NodeId, Scope};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descent {
    pub scope: Scope,
    pub entered: usize,
    pub skipped: usize,
}

/// Walk the recorded hops from the top document.
///
/// A hop whose host cannot be found (or no longer hosts the right kind of
/// scope) is skipped and the search stays in the nearest enclosing scope.
pub fn descend(page: &dyn PageView, chain: &[BoundaryHop]) -> Descent {
    let mut descent = Descent {
        scope: page.document(),
        entered: 0,
        skipped: 0,
    };
    for hop in chain {
        match find_host(page, descent.scope, hop) {
            Some(inner) => {
                descent.scope = inner;
                descent.entered += 1;
            }
            None => {
                debug!(host = %hop.host_xpath, kind = ?hop.kind, "boundary hop skipped");
                descent.skipped += 1;
            }
        }
    }
    descent
}

fn find_host(page: &dyn PageView, scope: Scope, hop: &BoundaryHop) -> Option<Scope> {
    let mut selectors = Vec::with_capacity(2);
    if let Some(css) = &hop.host_selector {
        selectors.push(Selector::css(css.clone()));
    }
    selectors.push(Selector::xpath(hop.host_xpath.clone()));

    for selector in selectors {
        let hosts: Vec<NodeId> = match page.query(&selector, scope) {
            Ok(hosts) => hosts,
            Err(err) => {
                warn!(%selector, error = %err, "boundary host query failed");
                continue;
            }
        };
        for host in hosts {
            if let Some((kind, inner)) = page.enter_boundary(host) {
                if kind == hop.kind {
                    return Some(inner);
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use page_host::{DocumentAccessor, MemoryPage, NodeSpec};
    use soulreplay_core_types::BoundaryKind;

    fn hop(kind: BoundaryKind, xpath: &str, css: Option<&str>) -> BoundaryHop {
        BoundaryHop {
            kind,
            host_xpath: xpath.into(),
            host_selector: css.map(str::to_string),
        }
    }

    #[test]
    fn selector_survives_sibling_shift() {
        let page = MemoryPage::with_body(
            "https://example.test/",
            [
                NodeSpec::new("div"),
                NodeSpec::new("iframe")
                    .id("pay")
                    .frame([NodeSpec::new("input").id("card")]),
            ],
        );
        // Captured when the iframe was the first body child.
        let chain = [hop(
            BoundaryKind::Iframe,
            "/html[1]/body[1]/iframe[2]",
            Some("iframe#pay"),
        )];
        let descent = descend(&page, &chain);
        assert_eq!(descent.entered, 1);
        let card = page.find_by_id("card").unwrap();
        assert_eq!(Some(descent.scope), page.scope_of(card));
    }

    #[test]
    fn missing_host_is_skipped() {
        let page = MemoryPage::with_body(
            "https://example.test/",
            [NodeSpec::new("div").shadow([NodeSpec::new("button").id("b")])],
        );
        let chain = [
            hop(BoundaryKind::Iframe, "/html[1]/body[1]/iframe[1]", None),
            hop(BoundaryKind::ShadowHost, "/html[1]/body[1]/div[1]", None),
        ];
        let descent = descend(&page, &chain);
        assert_eq!(descent.skipped, 1);
        assert_eq!(descent.entered, 1);
        let button = page.find_by_id("b").unwrap();
        assert_eq!(Some(descent.scope), page.scope_of(button));
    }

    #[test]
    fn wrong_kind_is_not_entered() {
        let page = MemoryPage::with_body(
            "https://example.test/",
            [NodeSpec::new("div").shadow([NodeSpec::new("span")])],
        );
        let chain = [hop(BoundaryKind::Iframe, "/html[1]/body[1]/div[1]", None)];
        let descent = descend(&page, &chain);
        assert_eq!(descent.scope, page.document());
        assert_eq!(descent.skipped, 1);
    }
}
