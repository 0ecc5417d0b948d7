//! The ordered label heuristics, expressed as a table of plain functions.
//!
//! Each heuristic returns a raw candidate (sanitized later by the engine) or
//! `None`. Host faults surface as `Err` and are treated as "no candidate".

use std::collections::BTreeMap;

use page_host::{collect_text, HostError, PageView, Selector};
use serde::{Deserialize, Serialize};
use soulreplay_core_types::NodeId;

/// How far up the tree contextual lookups walk.
pub(crate) const MAX_ANCESTOR_HOPS: usize = 8;
/// How deep nested graphic lookups descend.
const MAX_NESTED_DEPTH: usize = 4;

const NAME_PREFIXES: &[&str] = &[
    "btn", "input", "txt", "field", "lbl", "chk", "cb", "sel", "ddl", "fld", "tb",
];

const DATA_LABEL_ATTRS: &[&str] = &[
    "data-label",
    "data-title",
    "data-tooltip",
    "data-original-title",
    "data-placeholder",
    "data-name",
];

/// Where a detected label came from.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelSource {
    AriaLabel,
    AriaLabelledby,
    LabelElement,
    Placeholder,
    Title,
    Alt,
    Name,
    TextContent,
    ButtonValue,
    NestedGraphic,
    Nearby,
    DataLabel,
    PasswordOverride,
    Contextual,
    TagFallback,
}

impl LabelSource {
    pub fn name(&self) -> &'static str {
        match self {
            LabelSource::AriaLabel => "aria_label",
            LabelSource::AriaLabelledby => "aria_labelledby",
            LabelSource::LabelElement => "label_element",
            LabelSource::Placeholder => "placeholder",
            LabelSource::Title => "title",
            LabelSource::Alt => "alt",
            LabelSource::Name => "name",
            LabelSource::TextContent => "text_content",
            LabelSource::ButtonValue => "button_value",
            LabelSource::NestedGraphic => "nested_graphic",
            LabelSource::Nearby => "nearby",
            LabelSource::DataLabel => "data_label",
            LabelSource::PasswordOverride => "password_override",
            LabelSource::Contextual => "contextual",
            LabelSource::TagFallback => "tag_fallback",
        }
    }
}

/// Everything a heuristic may look at.
pub struct LabelContext<'a> {
    pub page: &'a dyn PageView,
    pub node: NodeId,
    pub tag: String,
    pub attrs: BTreeMap<String, String>,
}

impl<'a> LabelContext<'a> {
    pub fn new(page: &'a dyn PageView, node: NodeId) -> Self {
        Self {
            page,
            node,
            tag: page.tag_name(node).unwrap_or_default(),
            attrs: page.attributes(node),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn input_type(&self) -> Option<String> {
        if self.tag != "input" {
            return None;
        }
        Some(
            self.attr("type")
                .map(|t| t.trim().to_ascii_lowercase())
                .unwrap_or_else(|| "text".to_string()),
        )
    }
}

pub type HeuristicFn = fn(&LabelContext<'_>) -> Result<Option<String>, HostError>;

#[derive(Clone, Copy)]
pub struct Heuristic {
    pub source: LabelSource,
    pub run: HeuristicFn,
}

/// Default pipeline, highest priority first.
pub const HEURISTICS: [Heuristic; 12] = [
    Heuristic { source: LabelSource::AriaLabel, run: aria_label },
    Heuristic { source: LabelSource::AriaLabelledby, run: aria_labelledby },
    Heuristic { source: LabelSource::LabelElement, run: label_element },
    Heuristic { source: LabelSource::Placeholder, run: placeholder },
    Heuristic { source: LabelSource::Title, run: title },
    Heuristic { source: LabelSource::Alt, run: alt },
    Heuristic { source: LabelSource::Name, run: humanized_name },
    Heuristic { source: LabelSource::TextContent, run: text_content },
    Heuristic { source: LabelSource::ButtonValue, run: button_value },
    Heuristic { source: LabelSource::NestedGraphic, run: nested_graphic },
    Heuristic { source: LabelSource::Nearby, run: nearby },
    Heuristic { source: LabelSource::DataLabel, run: data_label },
];

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn aria_label(ctx: &LabelContext<'_>) -> Result<Option<String>, HostError> {
    Ok(non_empty(ctx.attr("aria-label")))
}

fn aria_labelledby(ctx: &LabelContext<'_>) -> Result<Option<String>, HostError> {
    Ok(ctx
        .attr("aria-labelledby")
        .and_then(|ids| referenced_text(ctx.page, ctx.node, ids)))
}

/// Text of the nodes named by an id reference list, space-joined in list order.
pub fn referenced_text(page: &dyn PageView, node: NodeId, ids: &str) -> Option<String> {
    let parts: Vec<String> = page
        .resolve_id_refs(node, ids)
        .into_iter()
        .map(|target| page.text_content(target))
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

fn label_element(ctx: &LabelContext<'_>) -> Result<Option<String>, HostError> {
    if let Some(id) = ctx.attr("id").filter(|id| !id.trim().is_empty()) {
        if let Some(scope) = ctx.page.scope_of(ctx.node) {
            let selector = Selector::css(format!("label[for=\"{}\"]", css_escape(id)));
            for label in ctx.page.query(&selector, scope)? {
                let text = collect_text(ctx.page, label, Some(ctx.node));
                if let Some(text) = non_empty(Some(&text)) {
                    return Ok(Some(text));
                }
            }
        }
    }

    let mut current = ctx.page.parent(ctx.node);
    let mut hops = 0;
    while let Some(ancestor) = current {
        if hops >= MAX_ANCESTOR_HOPS {
            break;
        }
        if ctx.page.tag_name(ancestor).as_deref() == Some("label") {
            let text = collect_text(ctx.page, ancestor, Some(ctx.node));
            return Ok(non_empty(Some(&text)));
        }
        current = ctx.page.parent(ancestor);
        hops += 1;
    }
    Ok(None)
}

fn placeholder(ctx: &LabelContext<'_>) -> Result<Option<String>, HostError> {
    Ok(non_empty(ctx.attr("placeholder")))
}

fn title(ctx: &LabelContext<'_>) -> Result<Option<String>, HostError> {
    Ok(non_empty(ctx.attr("title")))
}

fn alt(ctx: &LabelContext<'_>) -> Result<Option<String>, HostError> {
    Ok(non_empty(ctx.attr("alt")))
}

fn humanized_name(ctx: &LabelContext<'_>) -> Result<Option<String>, HostError> {
    Ok(ctx.attr("name").and_then(humanize_identifier))
}

/// Split camel/snake/kebab identifiers into words and drop a leading widget prefix.
pub fn humanize_identifier(raw: &str) -> Option<String> {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev: Option<char> = None;
    for ch in raw.chars() {
        if !ch.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev = None;
            continue;
        }
        let boundary = match prev {
            Some(p) => p.is_lowercase() && ch.is_uppercase(),
            None => false,
        };
        if boundary && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        current.push(ch);
        prev = Some(ch);
    }
    if !current.is_empty() {
        words.push(current);
    }

    if words.len() > 1
        && NAME_PREFIXES
            .iter()
            .any(|prefix| words[0].eq_ignore_ascii_case(prefix))
    {
        words.remove(0);
    }
    if words.is_empty() {
        None
    } else {
        Some(words.join(" "))
    }
}

fn text_content(ctx: &LabelContext<'_>) -> Result<Option<String>, HostError> {
    if matches!(ctx.tag.as_str(), "select" | "textarea" | "input") {
        return Ok(None);
    }
    Ok(non_empty(Some(&ctx.page.text_content(ctx.node))))
}

fn button_value(ctx: &LabelContext<'_>) -> Result<Option<String>, HostError> {
    match ctx.input_type().as_deref() {
        Some("button" | "submit" | "reset") => Ok(non_empty(ctx.attr("value"))),
        _ => Ok(None),
    }
}

fn nested_graphic(ctx: &LabelContext<'_>) -> Result<Option<String>, HostError> {
    let mut frontier = ctx.page.children(ctx.node);
    for _ in 0..MAX_NESTED_DEPTH {
        let mut next = Vec::new();
        for child in frontier {
            match ctx.page.tag_name(child).as_deref() {
                Some("img") => {
                    if let Some(alt) = non_empty(ctx.page.attribute(child, "alt").as_deref()) {
                        return Ok(Some(alt));
                    }
                }
                Some("svg") => {
                    if let Some(title) = non_empty(ctx.page.attribute(child, "aria-label").as_deref()) {
                        return Ok(Some(title));
                    }
                    for part in ctx.page.children(child) {
                        if ctx.page.tag_name(part).as_deref() == Some("title") {
                            if let Some(text) = non_empty(Some(&ctx.page.own_text(part))) {
                                return Ok(Some(text));
                            }
                        }
                    }
                }
                _ => {}
            }
            next.extend(ctx.page.children(child));
        }
        frontier = next;
    }
    Ok(None)
}

fn is_control_tag(tag: &str) -> bool {
    matches!(tag, "input" | "select" | "textarea" | "button")
}

fn nearby(ctx: &LabelContext<'_>) -> Result<Option<String>, HostError> {
    let Some(parent) = ctx.page.parent(ctx.node) else {
        return Ok(None);
    };

    let siblings = ctx.page.children(parent);
    if let Some(pos) = siblings.iter().position(|s| *s == ctx.node) {
        for sibling in siblings[..pos].iter().rev() {
            let tag = ctx.page.tag_name(*sibling).unwrap_or_default();
            if is_control_tag(&tag) || ctx.page.visibility(*sibling).is_hidden() {
                continue;
            }
            if let Some(text) = non_empty(Some(&ctx.page.text_content(*sibling))) {
                return Ok(Some(text));
            }
        }
    }

    if let Some(header) = table_header(ctx)? {
        return Ok(Some(header));
    }

    Ok(non_empty(Some(&ctx.page.own_text(parent))))
}

/// Column header of the table cell enclosing the node.
fn table_header(ctx: &LabelContext<'_>) -> Result<Option<String>, HostError> {
    let mut cell = None;
    let mut current = ctx.page.parent(ctx.node);
    let mut hops = 0;
    while let Some(ancestor) = current {
        if hops >= MAX_ANCESTOR_HOPS {
            break;
        }
        if matches!(ctx.page.tag_name(ancestor).as_deref(), Some("td" | "th")) {
            cell = Some(ancestor);
            break;
        }
        current = ctx.page.parent(ancestor);
        hops += 1;
    }
    let Some(cell) = cell else { return Ok(None) };
    let Some(row) = ctx.page.parent(cell) else { return Ok(None) };
    let column = ctx
        .page
        .children(row)
        .iter()
        .position(|c| *c == cell)
        .unwrap_or(0);

    let mut table = ctx.page.parent(row);
    while let Some(t) = table {
        if ctx.page.tag_name(t).as_deref() == Some("table") {
            break;
        }
        table = ctx.page.parent(t);
    }
    let Some(table) = table else { return Ok(None) };
    let Some(scope) = ctx.page.scope_of(table) else { return Ok(None) };

    for header_row in ctx.page.query(&Selector::css("tr"), scope)? {
        if !is_within(ctx.page, header_row, table) {
            continue;
        }
        let cells = ctx.page.children(header_row);
        let all_headers = !cells.is_empty()
            && cells
                .iter()
                .all(|c| ctx.page.tag_name(*c).as_deref() == Some("th"));
        if !all_headers {
            continue;
        }
        if let Some(header) = cells.get(column) {
            return Ok(non_empty(Some(&ctx.page.text_content(*header))));
        }
        return Ok(None);
    }
    Ok(None)
}

fn is_within(page: &dyn PageView, node: NodeId, ancestor: NodeId) -> bool {
    let mut current = page.parent(node);
    while let Some(id) = current {
        if id == ancestor {
            return true;
        }
        current = page.parent(id);
    }
    false
}

fn data_label(ctx: &LabelContext<'_>) -> Result<Option<String>, HostError> {
    Ok(DATA_LABEL_ATTRS
        .iter()
        .find_map(|name| non_empty(ctx.attr(name))))
}

pub(crate) fn css_escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
