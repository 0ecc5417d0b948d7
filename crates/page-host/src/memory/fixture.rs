use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use soulreplay_core_types::Rect;

/// Inline presentation flags of a fixture node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleSpec {
    pub display_none: bool,
    pub visibility_hidden: bool,
    pub opacity: Option<f64>,
}

/// Declarative element description used to build a [`super::MemoryPage`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeSpec {
    pub tag: String,
    pub attrs: BTreeMap<String, String>,
    pub text: Option<String>,
    pub style: StyleSpec,
    pub rect: Option<Rect>,
    pub children: Vec<NodeSpec>,
    /// Children of an attached shadow root
    pub shadow: Option<Vec<NodeSpec>>,
    /// Body children of the document loaded in this iframe
    pub frame: Option<Vec<NodeSpec>>,
    pub value: Option<String>,
    pub checked: Option<bool>,
    /// A keydown handler cancels the default Enter action
    pub prevent_enter: bool,
}

impl NodeSpec {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn id(self, id: impl Into<String>) -> Self {
        self.attr("id", id)
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn rect(mut self, rect: Rect) -> Self {
        self.rect = Some(rect);
        self
    }

    pub fn style(mut self, style: StyleSpec) -> Self {
        self.style = style;
        self
    }

    pub fn display_none(mut self) -> Self {
        self.style.display_none = true;
        self
    }

    pub fn child(mut self, child: NodeSpec) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = NodeSpec>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn shadow(mut self, children: impl IntoIterator<Item = NodeSpec>) -> Self {
        self.shadow = Some(children.into_iter().collect());
        self
    }

    pub fn frame(mut self, body: impl IntoIterator<Item = NodeSpec>) -> Self {
        self.frame = Some(body.into_iter().collect());
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn checked(mut self, checked: bool) -> Self {
        self.checked = Some(checked);
        self
    }

    pub fn prevent_enter(mut self) -> Self {
        self.prevent_enter = true;
        self
    }
}

/// A whole page: URL plus the children of `<body>`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageFixture {
    pub url: Option<String>,
    pub body: Vec<NodeSpec>,
}

impl PageFixture {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            body: Vec::new(),
        }
    }

    pub fn child(mut self, node: NodeSpec) -> Self {
        self.body.push(node);
        self
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_json_defaults() {
        let fixture = PageFixture::from_json(
            r#"{
                "url": "https://example.test/login",
                "body": [
                    {"tag": "input", "attrs": {"id": "email-field", "placeholder": "Enter email"}},
                    {"tag": "div", "style": {"display_none": true}, "children": [{"tag": "span", "text": "x"}]}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(fixture.body.len(), 2);
        assert_eq!(fixture.body[0].attrs["placeholder"], "Enter email");
        assert!(fixture.body[1].style.display_none);
        assert!(fixture.body[0].shadow.is_none());
    }
}
