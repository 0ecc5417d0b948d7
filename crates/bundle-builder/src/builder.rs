use label_detect::{DetectedLabel, LabelCache, LabelEngine, LabelPolicy};
use page_host::PageView;
use soulreplay_core_types::{BoundaryHop, EventKind, LocatorBundle, NodeId, Point, Step};
use tracing::debug;

use crate::attributes::{relevant_attributes, text_snippet};
use crate::boundary::{boundary_chain, BoundaryIndex};
use crate::css::css_selector;
use crate::policy::BuilderPolicy;
use crate::xpath::positional_xpath;

/// Synthesizes locator bundles and step labels at capture time.
///
/// Building never fails: a signal that cannot be read is left out.
pub struct BundleBuilder {
    policy: BuilderPolicy,
    labels: LabelEngine,
    label_cache: LabelCache,
}

impl Default for BundleBuilder {
    fn default() -> Self {
        Self::new(BuilderPolicy::default(), LabelPolicy::default())
    }
}

impl BundleBuilder {
    pub fn new(policy: BuilderPolicy, label_policy: LabelPolicy) -> Self {
        Self {
            policy,
            labels: LabelEngine::new(label_policy),
            label_cache: LabelCache::new(),
        }
    }

    pub fn policy(&self) -> &BuilderPolicy {
        &self.policy
    }

    pub fn label_engine(&self) -> &LabelEngine {
        &self.labels
    }

    /// Build a bundle for `node` with an already known boundary chain.
    pub fn build(
        &self,
        page: &dyn PageView,
        node: NodeId,
        boundary_chain: Vec<BoundaryHop>,
    ) -> LocatorBundle {
        let tag = page.tag_name(node).unwrap_or_default();
        let attrs = page.attributes(node);
        let is_password = tag == "input"
            && attrs
                .get("type")
                .map(|t| t.trim().eq_ignore_ascii_case("password"))
                .unwrap_or(false);
        let non_empty = |name: &str| {
            attrs
                .get(name)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let accessible_name = non_empty("aria-label").or_else(|| {
            attrs
                .get("aria-labelledby")
                .and_then(|ids| label_detect::referenced_text(page, node, ids))
        });

        let classes = page.class_list(node);
        let text = if matches!(tag.as_str(), "input" | "select" | "textarea") {
            None
        } else {
            text_snippet(&page.text_content(node), self.policy.text_max_length)
        };

        let bundle = LocatorBundle {
            id: non_empty("id"),
            name: non_empty("name"),
            placeholder: non_empty("placeholder"),
            title: non_empty("title"),
            href: non_empty("href"),
            src: non_empty("src"),
            role: non_empty("role"),
            accessible_name,
            text,
            css_selector: css_selector(
                &tag,
                attrs.get("id").map(String::as_str),
                classes.iter().map(String::as_str),
                self.policy.max_selector_classes,
            ),
            classes: classes.into_iter().collect(),
            attributes: relevant_attributes(&attrs, is_password),
            xpath: positional_xpath(page, node),
            bounding: page.bounding_rect(node),
            page_url: page.current_url(),
            boundary_chain,
            tag,
        };
        debug!(%node, xpath = %bundle.xpath, hops = bundle.boundary_chain.len(), "bundle built");
        bundle
    }

    /// Build a bundle, computing the boundary chain directly.
    pub fn capture(&self, page: &dyn PageView, node: NodeId) -> LocatorBundle {
        let chain = boundary_chain(page, node, &self.policy);
        self.build(page, node, chain)
    }

    /// Build a bundle, reusing hops recorded by `index` when the scope is known.
    pub fn capture_indexed(
        &self,
        page: &dyn PageView,
        node: NodeId,
        index: &BoundaryIndex,
    ) -> LocatorBundle {
        let chain = page
            .scope_of(node)
            .and_then(|scope| index.chain_for(scope))
            .unwrap_or_else(|| boundary_chain(page, node, &self.policy));
        self.build(page, node, chain)
    }

    /// Detected label for `node`, served from the node-keyed cache when possible.
    pub fn label(&self, page: &dyn PageView, node: NodeId) -> DetectedLabel {
        self.label_cache.get_or_detect(&self.labels, page, node)
    }

    pub fn sweep_labels(&self, page: &dyn PageView) -> usize {
        self.label_cache.sweep(page)
    }

    /// Assemble a complete step for an interaction on `node`.
    pub fn capture_step(
        &self,
        page: &dyn PageView,
        id: impl Into<String>,
        node: NodeId,
        event: EventKind,
        index: Option<&BoundaryIndex>,
    ) -> Step {
        let bundle = match index {
            Some(index) => self.capture_indexed(page, node, index),
            None => self.capture(page, node),
        };
        let label = self.label(page, node).label;
        let mut step = Step::new(id, label, event, bundle);
        if let Some(point) = capture_point(&step.bundle) {
            step = step.with_coordinates(point);
        }
        step
    }

    /// Step for a navigation, which has no target element.
    pub fn navigation_step(&self, id: impl Into<String>, url: &str) -> Step {
        let mut bundle = LocatorBundle::new("html", "/html[1]");
        bundle.page_url = Some(url.to_string());
        Step::new(id, "Navigate", EventKind::Navigate, bundle).with_value(url)
    }
}

/// Centre of a captured rectangle, if it has any area.
pub fn capture_point(bundle: &LocatorBundle) -> Option<Point> {
    bundle.bounding.filter(|r| !r.is_empty()).map(|r| r.center())
}

#[cfg(test)]
mod tests {
    use super::*;
    use page_host::{MemoryPage, NodeSpec};
    use pretty_assertions::assert_eq;
    use soulreplay_core_types::Rect;

    #[test]
    fn captures_all_signals() {
        let page = MemoryPage::with_body(
            "https://example.test/login",
            [NodeSpec::new("form").children([
                NodeSpec::new("span").id("lbl").text("Work email"),
                NodeSpec::new("input")
                    .id("email-field")
                    .attr("name", "email")
                    .attr("type", "email")
                    .attr("placeholder", "Enter email")
                    .attr("aria-labelledby", "lbl")
                    .attr("class", "form-control wide")
                    .attr("data-testid", "email")
                    .attr("style", "width: 100%")
                    .rect(Rect::new(10.0, 20.0, 200.0, 30.0)),
            ])],
        );
        let node = page.find_by_id("email-field").unwrap();
        let bundle = BundleBuilder::default().capture(&page, node);

        assert_eq!(bundle.tag, "input");
        assert_eq!(bundle.id.as_deref(), Some("email-field"));
        assert_eq!(bundle.name.as_deref(), Some("email"));
        assert_eq!(bundle.placeholder.as_deref(), Some("Enter email"));
        assert_eq!(bundle.accessible_name.as_deref(), Some("Work email"));
        assert_eq!(bundle.xpath, "/html[1]/body[1]/form[1]/input[1]");
        assert_eq!(bundle.css_selector.as_deref(), Some("input#email-field"));
        assert_eq!(bundle.page_url.as_deref(), Some("https://example.test/login"));
        assert_eq!(bundle.bounding, Some(Rect::new(10.0, 20.0, 200.0, 30.0)));
        assert!(bundle.classes.contains("wide"));
        assert_eq!(bundle.attribute("data-testid"), Some("email"));
        assert!(bundle.attribute("style").is_none());
        assert!(bundle.boundary_chain.is_empty());
        assert!(bundle.validate().is_ok());
    }

    #[test]
    fn text_excludes_hidden_children() {
        let page = MemoryPage::with_body(
            "https://example.test/",
            [NodeSpec::new("button").id("b").text("Save").children([
                NodeSpec::new("span").text("changes"),
                NodeSpec::new("span").display_none().text("(hidden hint)"),
            ])],
        );
        let node = page.find_by_id("b").unwrap();
        let bundle = BundleBuilder::default().capture(&page, node);
        assert_eq!(bundle.text.as_deref(), Some("Save changes"));
    }

    #[test]
    fn password_step_is_redacted() {
        let page = MemoryPage::with_body(
            "https://example.test/",
            [
                NodeSpec::new("label").attr("for", "pw").text("Your bank PIN"),
                NodeSpec::new("input")
                    .id("pw")
                    .attr("type", "password")
                    .attr("value", "hunter2"),
            ],
        );
        let node = page.find_by_id("pw").unwrap();
        let step = BundleBuilder::default().capture_step(&page, "s1", node, EventKind::Input, None);
        assert_eq!(step.label, "Password");
        assert!(step.bundle.attribute("value").is_none());
        assert!(step.coordinates.is_some());
    }

    #[test]
    fn navigation_step_carries_url() {
        let step = BundleBuilder::default().navigation_step("n1", "https://example.test/next");
        assert_eq!(step.event, EventKind::Navigate);
        assert_eq!(step.value.as_deref(), Some("https://example.test/next"));
        assert!(step.bundle.validate().is_ok());
    }

    #[test]
    fn field_switched_to_password_is_relabelled() {
        let page = MemoryPage::with_body(
            "https://example.test/",
            [NodeSpec::new("input")
                .id("pin")
                .attr("type", "text")
                .attr("aria-label", "Secret PIN")],
        );
        let builder = BundleBuilder::default();
        let node = page.find_by_id("pin").unwrap();
        let shown = builder.capture_step(&page, "s1", node, EventKind::Input, None);
        assert_eq!(shown.label, "Secret PIN");

        page.set_attribute(node, "type", "password").unwrap();
        let hidden = builder.capture_step(&page, "s2", node, EventKind::Input, None);
        assert_eq!(hidden.label, "Password");
    }
}
