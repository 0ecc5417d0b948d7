use std::path::Path;

use anyhow::{anyhow, Context, Result};
use bundle_builder::{BoundaryIndex, BuilderPolicy};
use page_host::{DocumentAccessor, MemoryPage, Selector};
use soulreplay_core_types::NodeId;
use tokio::fs;
use tracing::debug;

/// Load a JSON page fixture into an in-memory host.
pub async fn load_page(path: &Path) -> Result<MemoryPage> {
    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read page fixture {}", path.display()))?;
    MemoryPage::from_json(&raw)
        .with_context(|| format!("Failed to parse page fixture {}", path.display()))
}

/// `/...` is an XPath, anything else a CSS selector.
pub fn parse_target(target: &str) -> Selector {
    if target.starts_with('/') {
        Selector::xpath(target)
    } else {
        Selector::css(target)
    }
}

/// First node matching `target`, searching the top document and then every
/// nested frame or shadow scope in document order.
pub fn locate(page: &MemoryPage, target: &str, policy: &BuilderPolicy) -> Result<NodeId> {
    let selector = parse_target(target);
    let index = BoundaryIndex::scan(page, policy.clone());
    let mut scopes = vec![page.document()];
    scopes.extend(index.scopes());
    for scope in scopes {
        let found = page
            .query(&selector, scope)
            .with_context(|| format!("Invalid target {target}"))?;
        if let Some(node) = found.first() {
            debug!(%selector, %scope, %node, "target located");
            return Ok(*node);
        }
    }
    Err(anyhow!("No element matches {target}"))
}
