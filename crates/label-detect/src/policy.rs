use serde::{Deserialize, Serialize};

/// Label detection knobs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelPolicy {
    /// Longest label kept before truncating with an ellipsis
    pub max_length: usize,
    pub strip_emoji: bool,
    /// Heuristic names to skip, e.g. `["nearby", "name"]`
    pub disabled: Vec<String>,
}

impl Default for LabelPolicy {
    fn default() -> Self {
        Self {
            max_length: 50,
            strip_emoji: true,
            disabled: Vec::new(),
        }
    }
}

impl LabelPolicy {
    pub fn is_enabled(&self, heuristic: &str) -> bool {
        !self
            .disabled
            .iter()
            .any(|name| name.eq_ignore_ascii_case(heuristic))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_policy_keeps_defaults() {
        let policy: LabelPolicy = serde_json::from_str(r#"{"disabled": ["Nearby"]}"#).unwrap();
        assert_eq!(policy.max_length, 50);
        assert!(policy.strip_emoji);
        assert!(!policy.is_enabled("nearby"));
        assert!(policy.is_enabled("placeholder"));
    }
}
