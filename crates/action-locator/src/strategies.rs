//! Individual resolution strategies.
//!
//! Each strategy is a plain function over [`StrategyInput`] returning the raw
//! candidates it considers matches, in document order. Visibility gating and
//! tie-breaking happen afterwards in [`evaluate`].

use page_host::{HostError, PageView, Selector};
use soulreplay_core_types::{LocatorBundle, NodeId, Point, Scope};
use tracing::debug;

use crate::policy::FinderPolicy;
use crate::types::{LocatorStrategy, StrategyResult};

/// Everything a strategy may look at.
pub struct StrategyInput<'a> {
    pub page: &'a dyn PageView,
    pub scope: Scope,
    pub bundle: &'a LocatorBundle,
    pub policy: &'a FinderPolicy,
    /// Step label, used as the fuzzy reference when the bundle carries no text
    pub label_hint: Option<&'a str>,
}

pub type StrategyFn = fn(&StrategyInput<'_>) -> Result<Vec<NodeId>, HostError>;

/// Function implementing `strategy`.
pub fn strategy_fn(strategy: LocatorStrategy) -> StrategyFn {
    match strategy {
        LocatorStrategy::Xpath => by_xpath,
        LocatorStrategy::Id => by_id,
        LocatorStrategy::Name => by_name,
        LocatorStrategy::AccessibleName => by_accessible_name,
        LocatorStrategy::Placeholder => by_placeholder,
        LocatorStrategy::DataAttributes => by_data_attributes,
        LocatorStrategy::Css => by_css,
        LocatorStrategy::FuzzyText => by_fuzzy_text,
        LocatorStrategy::Geometry => by_geometry,
    }
}

/// Run one strategy, gate its candidates and pick a single winner.
pub fn evaluate(
    strategy: LocatorStrategy,
    input: &StrategyInput<'_>,
) -> Result<Option<StrategyResult>, HostError> {
    let raw = (strategy_fn(strategy))(input)?;
    let visible: Vec<NodeId> = raw
        .into_iter()
        .filter(|node| input.page.is_connected(*node))
        .filter(|node| !input.policy.visibility_gate || is_visible(input.page, *node))
        .collect();
    let Some(node) = tie_break(input.page, input.bundle, &visible) else {
        return Ok(None);
    };
    if visible.len() > 1 {
        debug!(strategy = strategy.name(), candidates = visible.len(), %node, "ambiguous match tie-broken");
    }
    Ok(Some(StrategyResult {
        node,
        strategy,
        confidence: strategy.confidence_ceiling(),
        candidates: visible.len(),
    }))
}

/// Not hidden by style and occupying a non-empty rectangle.
pub fn is_visible(page: &dyn PageView, node: NodeId) -> bool {
    if page.visibility(node).is_hidden() {
        return false;
    }
    page.bounding_rect(node)
        .map(|rect| !rect.is_empty())
        .unwrap_or(false)
}

/// Prefer the candidate sharing the most classes and attribute values with
/// the bundle; equal scores keep the earliest in document order.
pub fn tie_break(page: &dyn PageView, bundle: &LocatorBundle, candidates: &[NodeId]) -> Option<NodeId> {
    let mut best: Option<(NodeId, usize)> = None;
    for node in candidates {
        let score = overlap_score(page, bundle, *node);
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((*node, score)),
        }
    }
    best.map(|(node, _)| node)
}

fn overlap_score(page: &dyn PageView, bundle: &LocatorBundle, node: NodeId) -> usize {
    let classes = page
        .class_list(node)
        .iter()
        .filter(|class| bundle.classes.contains(*class))
        .count();
    let attrs = page.attributes(node);
    let attributes = bundle
        .attributes
        .iter()
        .filter(|(name, value)| attrs.get(*name) == Some(*value))
        .count();
    classes + attributes
}

/// Quote a value for use inside a `[attr="..."]` selector.
pub(crate) fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if matches!(c, '"' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

fn same_tag(page: &dyn PageView, node: NodeId, tag: &str) -> bool {
    tag.is_empty()
        || page
            .tag_name(node)
            .map(|t| t.eq_ignore_ascii_case(tag))
            .unwrap_or(false)
}

/// Nodes whose `name` attribute equals `value` once trimmed. Bundles store
/// trimmed values, live attributes may still carry padding.
fn attr_matches(
    input: &StrategyInput<'_>,
    name: &str,
    value: &str,
) -> Result<Vec<NodeId>, HostError> {
    Ok(input
        .page
        .query(&Selector::css(format!("[{}]", name)), input.scope)?
        .into_iter()
        .filter(|node| input.page.attribute(*node, name).as_deref().map(str::trim) == Some(value))
        .collect())
}

fn query_attr(input: &StrategyInput<'_>, name: &str, value: &str) -> Result<Vec<NodeId>, HostError> {
    Ok(attr_matches(input, name, value)?
        .into_iter()
        .filter(|node| same_tag(input.page, *node, &input.bundle.tag))
        .collect())
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// The recorded path, accepted only while the node there still looks like
/// the captured one.
fn by_xpath(input: &StrategyInput<'_>) -> Result<Vec<NodeId>, HostError> {
    let bundle = input.bundle;
    let hits = input
        .page
        .query(&Selector::xpath(bundle.xpath.clone()), input.scope)?;
    Ok(hits
        .into_iter()
        .filter(|node| same_tag(input.page, *node, &bundle.tag))
        .filter(|node| {
            [("id", &bundle.id), ("name", &bundle.name)]
                .into_iter()
                .all(|(attr, expected)| match non_empty(expected) {
                    Some(expected) => {
                        input.page.attribute(*node, attr).as_deref().map(str::trim) == Some(expected)
                    }
                    None => true,
                })
        })
        .collect())
}

fn by_id(input: &StrategyInput<'_>) -> Result<Vec<NodeId>, HostError> {
    let Some(id) = non_empty(&input.bundle.id) else {
        return Ok(Vec::new());
    };
    attr_matches(input, "id", id)
}

fn by_name(input: &StrategyInput<'_>) -> Result<Vec<NodeId>, HostError> {
    match non_empty(&input.bundle.name) {
        Some(name) => query_attr(input, "name", name),
        None => Ok(Vec::new()),
    }
}

fn by_placeholder(input: &StrategyInput<'_>) -> Result<Vec<NodeId>, HostError> {
    match non_empty(&input.bundle.placeholder) {
        Some(placeholder) => query_attr(input, "placeholder", placeholder),
        None => Ok(Vec::new()),
    }
}

fn by_accessible_name(input: &StrategyInput<'_>) -> Result<Vec<NodeId>, HostError> {
    let Some(expected) = non_empty(&input.bundle.accessible_name) else {
        return Ok(Vec::new());
    };
    let mut found = query_attr(input, "aria-label", expected)?;
    let labelled = input
        .page
        .query(&Selector::css("[aria-labelledby]"), input.scope)?;
    for node in labelled {
        if found.contains(&node) || !same_tag(input.page, node, &input.bundle.tag) {
            continue;
        }
        let text = input
            .page
            .attribute(node, "aria-labelledby")
            .and_then(|ids| label_detect::referenced_text(input.page, node, &ids));
        if text.map(|t| collapse_ws(&t)).as_deref() == Some(collapse_ws(expected).as_str()) {
            found.push(node);
        }
    }
    found.sort();
    Ok(found)
}

fn by_data_attributes(input: &StrategyInput<'_>) -> Result<Vec<NodeId>, HostError> {
    let data: Vec<(&str, &str)> = input.bundle.data_attributes().collect();
    if data.is_empty() {
        return Ok(Vec::new());
    }
    let mut selector = input.bundle.tag.clone();
    for (name, value) in &data {
        selector.push_str(&format!("[{}={}]", name, quote(value)));
    }
    input.page.query(&Selector::css(selector), input.scope)
}

fn by_css(input: &StrategyInput<'_>) -> Result<Vec<NodeId>, HostError> {
    if let Some(css) = non_empty(&input.bundle.css_selector) {
        match input.page.query(&Selector::css(css), input.scope) {
            Ok(found) if !found.is_empty() => return Ok(found),
            Ok(_) => {}
            Err(HostError::InvalidSelector(reason)) => {
                debug!(selector = css, %reason, "captured css selector rejected by host");
            }
            Err(err) => return Err(err),
        }
    }
    if input.bundle.classes.is_empty() {
        return Ok(Vec::new());
    }
    let mut selector = input.bundle.tag.clone();
    for class in &input.bundle.classes {
        selector.push_str(&format!("[class~={}]", quote(class)));
    }
    input.page.query(&Selector::css(selector), input.scope)
}

/// Same-tag elements in scope, optionally restricted to visible ones.
fn same_tag_candidates(input: &StrategyInput<'_>) -> Result<Vec<NodeId>, HostError> {
    let tag = if input.bundle.tag.is_empty() {
        "*"
    } else {
        input.bundle.tag.as_str()
    };
    Ok(input
        .page
        .query(&Selector::css(tag), input.scope)?
        .into_iter()
        .filter(|node| !input.policy.visibility_gate || is_visible(input.page, *node))
        .collect())
}

fn collapse_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn normalize_text(text: &str) -> String {
    collapse_ws(text).to_lowercase()
}

/// Text similarity against same-tag elements. Every candidate sharing the
/// best score at or above the floor is returned.
fn by_fuzzy_text(input: &StrategyInput<'_>) -> Result<Vec<NodeId>, HostError> {
    let reference = non_empty(&input.bundle.text)
        .or_else(|| non_empty(&input.bundle.accessible_name))
        .or(input.label_hint.map(str::trim).filter(|v| !v.is_empty()));
    let Some(reference) = reference.map(normalize_text) else {
        return Ok(Vec::new());
    };

    let mut best: Vec<NodeId> = Vec::new();
    let mut best_score: Option<f64> = None;
    for node in same_tag_candidates(input)? {
        let text = normalize_text(&input.page.text_content(node));
        if text.is_empty() {
            continue;
        }
        let score = strsim::normalized_levenshtein(&reference, &text);
        if score <= input.policy.fuzzy_min_similarity {
            continue;
        }
        match best_score {
            Some(top) if score < top => {}
            Some(top) if score == top => best.push(node),
            _ => {
                best_score = Some(score);
                best.clear();
                best.push(node);
            }
        }
    }
    Ok(best)
}

/// Nearest same-tag element to the captured centre, within the radius.
fn by_geometry(input: &StrategyInput<'_>) -> Result<Vec<NodeId>, HostError> {
    let Some(target) = input
        .bundle
        .bounding
        .filter(|rect| !rect.is_empty())
        .map(|rect| rect.center())
    else {
        return Ok(Vec::new());
    };

    let mut nearest: Vec<NodeId> = Vec::new();
    let mut nearest_distance: Option<f64> = None;
    for node in same_tag_candidates(input)? {
        let Some(center) = centre_of(input.page, node) else {
            continue;
        };
        let distance = center.distance_to(&target);
        if distance >= input.policy.geometry_radius_px {
            continue;
        }
        match nearest_distance {
            Some(best) if distance > best => {}
            Some(best) if distance == best => nearest.push(node),
            _ => {
                nearest_distance = Some(distance);
                nearest.clear();
                nearest.push(node);
            }
        }
    }
    Ok(nearest)
}

fn centre_of(page: &dyn PageView, node: NodeId) -> Option<Point> {
    page.bounding_rect(node)
        .filter(|rect| !rect.is_empty())
        .map(|rect| rect.center())
}
