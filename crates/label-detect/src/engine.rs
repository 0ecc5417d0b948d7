use page_host::PageView;
use serde::{Deserialize, Serialize};
use soulreplay_core_types::NodeId;
use tracing::debug;

use crate::heuristics::{
    referenced_text, Heuristic, LabelContext, LabelSource, HEURISTICS, MAX_ANCESTOR_HOPS,
};
use crate::policy::LabelPolicy;
use crate::sanitize::{is_numeric_label, sanitize};

pub const PASSWORD_LABEL: &str = "Password";

/// A sanitized label plus the heuristic that produced it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedLabel {
    pub label: String,
    pub source: LabelSource,
}

impl DetectedLabel {
    /// The fixed label of every password control.
    pub fn password() -> Self {
        Self {
            label: PASSWORD_LABEL.to_string(),
            source: LabelSource::PasswordOverride,
        }
    }
}

/// Ordered heuristic pipeline producing one human label per node.
#[derive(Clone)]
pub struct LabelEngine {
    policy: LabelPolicy,
    pipeline: Vec<Heuristic>,
}

impl Default for LabelEngine {
    fn default() -> Self {
        Self::new(LabelPolicy::default())
    }
}

impl LabelEngine {
    pub fn new(policy: LabelPolicy) -> Self {
        let pipeline = HEURISTICS
            .iter()
            .copied()
            .filter(|h| policy.is_enabled(h.source.name()))
            .collect();
        Self { policy, pipeline }
    }

    pub fn policy(&self) -> &LabelPolicy {
        &self.policy
    }

    /// Names of the active heuristics in evaluation order.
    pub fn pipeline(&self) -> Vec<&'static str> {
        self.pipeline.iter().map(|h| h.source.name()).collect()
    }

    pub fn detect(&self, page: &dyn PageView, node: NodeId) -> String {
        self.detect_with_source(page, node).label
    }

    pub fn detect_with_source(&self, page: &dyn PageView, node: NodeId) -> DetectedLabel {
        let ctx = LabelContext::new(page, node);

        if ctx.input_type().as_deref() == Some("password") {
            return DetectedLabel::password();
        }

        for heuristic in &self.pipeline {
            let raw = match (heuristic.run)(&ctx) {
                Ok(Some(raw)) => raw,
                Ok(None) => continue,
                Err(err) => {
                    debug!(heuristic = heuristic.source.name(), %node, error = %err, "label heuristic faulted");
                    continue;
                }
            };
            let Some(label) = sanitize(&raw, &self.policy) else {
                continue;
            };
            if is_numeric_label(&label) {
                debug!(heuristic = heuristic.source.name(), %node, "numeric label candidate rejected");
                break;
            }
            return DetectedLabel {
                label,
                source: heuristic.source,
            };
        }

        if let Some(label) = self.contextual(&ctx) {
            return DetectedLabel {
                label,
                source: LabelSource::Contextual,
            };
        }

        DetectedLabel {
            label: fallback_label(&ctx),
            source: LabelSource::TagFallback,
        }
    }

    /// Ancestor aria-label/title, or an enclosing fieldset legend.
    fn contextual(&self, ctx: &LabelContext<'_>) -> Option<String> {
        let accept = |raw: &str| {
            sanitize(raw, &self.policy).filter(|label| !is_numeric_label(label))
        };

        let mut current = ctx.page.parent(ctx.node);
        let mut hops = 0;
        while let Some(ancestor) = current {
            if hops >= MAX_ANCESTOR_HOPS {
                break;
            }
            for attr in ["aria-label", "title"] {
                if let Some(label) = ctx.page.attribute(ancestor, attr).and_then(|v| accept(&v)) {
                    return Some(label);
                }
            }
            if let Some(label) = ctx
                .page
                .attribute(ancestor, "aria-labelledby")
                .and_then(|ids| referenced_text(ctx.page, ancestor, &ids))
                .and_then(|text| accept(&text))
            {
                return Some(label);
            }
            if ctx.page.tag_name(ancestor).as_deref() == Some("fieldset") {
                let legend = ctx
                    .page
                    .children(ancestor)
                    .into_iter()
                    .find(|c| ctx.page.tag_name(*c).as_deref() == Some("legend"));
                if let Some(label) = legend.and_then(|l| accept(&ctx.page.text_content(l))) {
                    return Some(label);
                }
            }
            current = ctx.page.parent(ancestor);
            hops += 1;
        }
        None
    }
}

/// Synthetic label from the element kind.
fn fallback_label(ctx: &LabelContext<'_>) -> String {
    let label = match ctx.tag.as_str() {
        "input" => match ctx.input_type().as_deref() {
            Some("checkbox") => "Checkbox",
            Some("radio") => "Radio Button",
            Some("button" | "submit" | "reset" | "image") => "Button",
            Some("file") => "File Input",
            _ => "Text Input",
        },
        "select" => "Dropdown",
        "textarea" => "Text Area",
        "button" => "Button",
        "a" => "Link",
        "img" => "Image",
        "" => "Element",
        other => return crate::sanitize::title_case(other),
    };
    label.to_string()
}
