//! Absolute positional XPath subset: `/tag[n]/tag[n]/...`, `*` allowed,
//! an omitted index selects every matching child.

use soulreplay_core_types::NodeId;

use super::tree::Tree;
use crate::errors::HostError;

#[derive(Clone, Debug, PartialEq, Eq)]
struct XPathStep {
    tag: Option<String>,
    index: Option<usize>,
}

pub(crate) fn evaluate(tree: &Tree, root: NodeId, path: &str) -> Result<Vec<NodeId>, HostError> {
    let steps = parse(path)?;
    let mut frontier = vec![root];
    for step in &steps {
        let mut next = Vec::new();
        for parent in &frontier {
            let Some(data) = tree.get(*parent) else { continue };
            let matching: Vec<NodeId> = data
                .children
                .iter()
                .copied()
                .filter(|child| {
                    tree.element(*child)
                        .map(|c| step.tag.as_ref().map(|t| &c.tag == t).unwrap_or(true))
                        .unwrap_or(false)
                })
                .collect();
            match step.index {
                Some(index) => next.extend(matching.get(index - 1).copied()),
                None => next.extend(matching),
            }
        }
        if next.is_empty() {
            return Ok(next);
        }
        frontier = next;
    }
    Ok(frontier)
}

fn parse(path: &str) -> Result<Vec<XPathStep>, HostError> {
    let invalid = || HostError::InvalidSelector(path.to_string());
    let trimmed = path.trim();
    let rest = trimmed.strip_prefix('/').ok_or_else(invalid)?;
    if rest.is_empty() {
        return Err(invalid());
    }
    rest.split('/')
        .map(|raw| {
            let (name, index) = match raw.find('[') {
                Some(open) => {
                    let close = raw.strip_suffix(']').ok_or_else(invalid)?;
                    let index: usize = close[open + 1..].trim().parse().map_err(|_| invalid())?;
                    if index == 0 {
                        return Err(invalid());
                    }
                    (&raw[..open], Some(index))
                }
                None => (raw, None),
            };
            let name = name.trim();
            if name.is_empty() {
                return Err(invalid());
            }
            let tag = if name == "*" {
                None
            } else if name.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_') {
                Some(name.to_ascii_lowercase())
            } else {
                return Err(invalid());
            };
            Ok(XPathStep { tag, index })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::fixture::NodeSpec;

    fn tree() -> Tree {
        let mut tree = Tree::new(None);
        let doc = tree.document;
        tree.populate_document(
            doc,
            &[
                NodeSpec::new("div").child(NodeSpec::new("input").id("first")),
                NodeSpec::new("div").children([
                    NodeSpec::new("input").id("second"),
                    NodeSpec::new("span"),
                    NodeSpec::new("input").id("third"),
                ]),
            ],
        );
        tree
    }

    fn ids(tree: &Tree, nodes: Vec<NodeId>) -> Vec<String> {
        nodes
            .into_iter()
            .map(|n| tree.get(n).unwrap().attrs["id"].clone())
            .collect()
    }

    #[test]
    fn positional_steps() {
        let tree = tree();
        let found = evaluate(&tree, tree.document, "/html[1]/body[1]/div[2]/input[2]").unwrap();
        assert_eq!(ids(&tree, found), vec!["third"]);
        let all = evaluate(&tree, tree.document, "/html/body/div/input").unwrap();
        assert_eq!(ids(&tree, all), vec!["first", "second", "third"]);
        let star = evaluate(&tree, tree.document, "/html[1]/body[1]/*[2]/*[2]").unwrap();
        assert_eq!(tree.get(star[0]).unwrap().tag, "span");
    }

    #[test]
    fn out_of_range_is_empty() {
        let tree = tree();
        assert!(evaluate(&tree, tree.document, "/html[1]/body[1]/div[3]")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn malformed_paths() {
        let tree = tree();
        for bad in ["", "html[1]", "/", "/html[0]", "/html[x]", "//div", "/div[1"] {
            assert!(evaluate(&tree, tree.document, bad).is_err(), "{bad}");
        }
    }
}
