use page_host::PageView;
use soulreplay_core_types::NodeId;

/// Ancestor hops walked before giving up on a pathological tree.
const MAX_XPATH_DEPTH: usize = 256;

/// Positional XPath of `node` relative to its own scope root.
///
/// Always returns a non-empty absolute path; unknown handles degrade to `/*[1]`.
pub fn positional_xpath(page: &dyn PageView, node: NodeId) -> String {
    let mut segments = Vec::new();
    let mut current = Some(node);
    while let Some(id) = current {
        if segments.len() >= MAX_XPATH_DEPTH {
            break;
        }
        let tag = page.tag_name(id).unwrap_or_else(|| "*".to_string());
        let parent = page.parent(id);
        let siblings = match parent {
            Some(p) => page.children(p),
            None => page
                .scope_of(id)
                .map(|scope| page.children(scope.root()))
                .unwrap_or_default(),
        };
        let index = siblings
            .iter()
            .take_while(|s| **s != id)
            .filter(|s| tag == "*" || page.tag_name(**s).as_deref() == Some(tag.as_str()))
            .count()
            + 1;
        segments.push(format!("{}[{}]", tag, index));
        current = parent;
    }
    if segments.is_empty() {
        return "/*[1]".to_string();
    }
    segments.reverse();
    format!("/{}", segments.join("/"))
}
