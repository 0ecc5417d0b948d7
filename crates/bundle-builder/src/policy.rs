use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderPolicy {
    /// Visible-text snippet cap, in characters
    pub text_max_length: usize,
    /// Deepest iframe/shadow nesting recorded in a boundary chain
    pub max_boundary_depth: usize,
    /// Classes kept in a synthesized CSS selector
    pub max_selector_classes: usize,
}

impl Default for BuilderPolicy {
    fn default() -> Self {
        Self {
            text_max_length: 100,
            max_boundary_depth: 16,
            max_selector_classes: 3,
        }
    }
}
