//! Core types for locator system

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use soulreplay_core_types::{NodeId, Scope};

/// Locator strategy enumeration, in default priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocatorStrategy {
    /// Recorded positional XPath
    Xpath,

    /// Element id
    Id,

    /// `name` attribute
    Name,

    /// aria-label or aria-labelledby text
    AccessibleName,

    Placeholder,

    /// Every captured `data-*` attribute matches
    DataAttributes,

    /// Captured CSS selector or class set
    Css,

    /// Visible text similarity
    FuzzyText,

    /// Nearest element to the captured rectangle
    Geometry,
}

impl LocatorStrategy {
    /// Get strategy name as string
    pub fn name(&self) -> &'static str {
        match self {
            LocatorStrategy::Xpath => "xpath",
            LocatorStrategy::Id => "id",
            LocatorStrategy::Name => "name",
            LocatorStrategy::AccessibleName => "accessible_name",
            LocatorStrategy::Placeholder => "placeholder",
            LocatorStrategy::DataAttributes => "data_attributes",
            LocatorStrategy::Css => "css",
            LocatorStrategy::FuzzyText => "fuzzy_text",
            LocatorStrategy::Geometry => "geometry",
        }
    }

    /// Confidence annotation attached to a match from this strategy.
    ///
    /// Never compared across strategies; priority order alone decides.
    pub fn confidence_ceiling(&self) -> f64 {
        match self {
            LocatorStrategy::Xpath => 1.0,
            LocatorStrategy::Id => 0.9,
            LocatorStrategy::Name => 0.8,
            LocatorStrategy::AccessibleName => 0.75,
            LocatorStrategy::Placeholder => 0.7,
            LocatorStrategy::DataAttributes => 0.65,
            LocatorStrategy::Css => 0.55,
            LocatorStrategy::FuzzyText => 0.4,
            LocatorStrategy::Geometry => 0.3,
        }
    }

    /// Get all strategies in fallback order
    pub fn fallback_chain() -> Vec<LocatorStrategy> {
        vec![
            LocatorStrategy::Xpath,
            LocatorStrategy::Id,
            LocatorStrategy::Name,
            LocatorStrategy::AccessibleName,
            LocatorStrategy::Placeholder,
            LocatorStrategy::DataAttributes,
            LocatorStrategy::Css,
            LocatorStrategy::FuzzyText,
            LocatorStrategy::Geometry,
        ]
    }
}

impl fmt::Display for LocatorStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Winner of one strategy evaluation after tie-break.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyResult {
    pub node: NodeId,
    pub strategy: LocatorStrategy,
    pub confidence: f64,
    /// Visible candidates the strategy produced before tie-break
    pub candidates: usize,
}

/// Result of a successful resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionOutcome {
    pub node: NodeId,
    pub strategy: LocatorStrategy,
    pub confidence: f64,
    pub elapsed: Duration,
    pub attempts: u32,
    /// Scope the strategies ran in after boundary re-descent
    pub scope: Scope,
    /// Recorded boundary hops that could not be re-entered
    pub skipped_hops: usize,
}
