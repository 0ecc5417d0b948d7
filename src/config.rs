//! Aggregated engine configuration for the `soulreplay` binary.

use action_locator::FinderPolicy;
use action_primitives::ExecutorPolicy;
use bundle_builder::BuilderPolicy;
use capture_session::CapturePolicy;
use label_detect::LabelPolicy;
use serde::{Deserialize, Serialize};

/// Every engine policy in one YAML document. Sections may be omitted.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    pub label: LabelPolicy,
    pub builder: BuilderPolicy,
    pub finder: FinderPolicy,
    pub executor: ExecutorPolicy,
    pub capture: CapturePolicy,
}

impl ReplayConfig {
    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        // An empty file deserializes to unit, not to an empty mapping.
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_locator::LocatorStrategy;
    use pretty_assertions::assert_eq;

    #[test]
    fn partial_sections_keep_defaults() {
        let config = ReplayConfig::from_yaml(
            "finder:\n  timeout_ms: 750\n  strategies: [name, xpath]\nlabel:\n  max_length: 20\n",
        )
        .unwrap();
        assert_eq!(config.finder.timeout_ms, 750);
        assert_eq!(config.finder.poll_interval_ms, 150);
        assert_eq!(
            config.finder.strategies,
            vec![LocatorStrategy::Name, LocatorStrategy::Xpath]
        );
        assert_eq!(config.label.max_length, 20);
        assert!(config.label.strip_emoji);
        assert_eq!(config.executor, ExecutorPolicy::default());
        assert_eq!(config.capture.debounce_ms, 500);
    }

    #[test]
    fn empty_document_is_default() {
        assert_eq!(ReplayConfig::from_yaml("  \n").unwrap(), ReplayConfig::default());
    }

    #[test]
    fn yaml_output_reloads() {
        let mut config = ReplayConfig::default();
        config.executor.strict = true;
        config.capture.throttle_ms = 250;
        let yaml = config.to_yaml().unwrap();
        assert_eq!(ReplayConfig::from_yaml(&yaml).unwrap(), config);
    }
}
