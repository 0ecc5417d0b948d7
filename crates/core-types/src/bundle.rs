use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use crate::geometry::Rect;

/// Kind of boundary crossed on the way from the top document to a node.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum BoundaryKind {
    Iframe,
    ShadowHost,
}

/// One recorded hop of a boundary chain.
///
/// The host element is described in the coordinates of its own (enclosing)
/// scope so it can be re-found even when its siblings changed.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BoundaryHop {
    pub kind: BoundaryKind,
    pub host_xpath: String,
    pub host_selector: Option<String>,
}

/// Immutable multi-signal descriptor of a captured element.
///
/// Only `xpath` is guaranteed to be non-empty; every other signal is optional
/// and may be missing when the element did not carry it at capture time.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(default))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LocatorBundle {
    pub tag: String,
    pub id: Option<String>,
    pub name: Option<String>,
    pub placeholder: Option<String>,
    pub title: Option<String>,
    pub href: Option<String>,
    pub src: Option<String>,
    pub role: Option<String>,
    pub accessible_name: Option<String>,
    pub text: Option<String>,
    pub classes: BTreeSet<String>,
    pub attributes: BTreeMap<String, String>,
    pub xpath: String,
    pub css_selector: Option<String>,
    pub bounding: Option<Rect>,
    pub page_url: Option<String>,
    pub boundary_chain: Vec<BoundaryHop>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BundleError {
    #[error("bundle has no xpath")]
    MissingXPath,

    #[error("bundle xpath is not absolute: {0}")]
    MalformedXPath(String),
}

impl LocatorBundle {
    /// Minimal bundle: a tag and its positional XPath.
    pub fn new(tag: impl Into<String>, xpath: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            xpath: xpath.into(),
            ..Self::default()
        }
    }

    /// Reject bundles the finder cannot work with.
    pub fn validate(&self) -> Result<(), BundleError> {
        let xpath = self.xpath.trim();
        if xpath.is_empty() {
            return Err(BundleError::MissingXPath);
        }
        if !xpath.starts_with('/') {
            return Err(BundleError::MalformedXPath(xpath.to_string()));
        }
        Ok(())
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Captured `data-*` attributes in name order.
    pub fn data_attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .filter(|(name, _)| name.starts_with("data-"))
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn input_type(&self) -> Option<&str> {
        self.attribute("type")
    }

    pub fn is_password(&self) -> bool {
        self.input_type()
            .map(|ty| ty.eq_ignore_ascii_case("password"))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_requires_absolute_xpath() {
        assert_eq!(
            LocatorBundle::new("input", "").validate(),
            Err(BundleError::MissingXPath)
        );
        assert_eq!(
            LocatorBundle::new("input", "  ").validate(),
            Err(BundleError::MissingXPath)
        );
        assert!(matches!(
            LocatorBundle::new("input", "body/input").validate(),
            Err(BundleError::MalformedXPath(_))
        ));
        assert!(LocatorBundle::new("input", "/html[1]/body[1]/input[1]")
            .validate()
            .is_ok());
    }

    #[test]
    fn data_attributes_filtered() {
        let mut bundle = LocatorBundle::new("button", "/html[1]/body[1]/button[1]");
        bundle.attributes.insert("data-testid".into(), "save".into());
        bundle.attributes.insert("type".into(), "submit".into());
        bundle.attributes.insert("data-row".into(), "3".into());

        let data: Vec<_> = bundle.data_attributes().collect();
        assert_eq!(data, vec![("data-row", "3"), ("data-testid", "save")]);
        assert_eq!(bundle.input_type(), Some("submit"));
        assert!(!bundle.is_password());
    }

    #[cfg(feature = "serde-full")]
    #[test]
    fn partial_json_deserializes_with_defaults() {
        let bundle: LocatorBundle =
            serde_json::from_str(r#"{"tag":"input","xpath":"/html[1]/body[1]/input[1]"}"#)
                .unwrap();
        assert_eq!(bundle.tag, "input");
        assert!(bundle.id.is_none());
        assert!(bundle.boundary_chain.is_empty());
    }
}
