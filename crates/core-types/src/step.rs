use std::fmt;

use crate::bundle::LocatorBundle;
use crate::geometry::Point;

/// Interaction recorded for a step.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(rename_all = "lowercase"))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum EventKind {
    Click,
    Input,
    Enter,
    Navigate,
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Click => "click",
            EventKind::Input => "input",
            EventKind::Enter => "enter",
            EventKind::Navigate => "navigate",
        }
    }

    /// Whether replaying this kind needs a resolved target node.
    pub fn needs_target(&self) -> bool {
        !matches!(self, EventKind::Navigate)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One recorded interaction. An ordered list of steps forms a scenario.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Step {
    pub id: String,
    pub label: String,
    pub event: EventKind,
    pub bundle: LocatorBundle,
    #[cfg_attr(feature = "serde-full", serde(default))]
    pub value: Option<String>,
    #[cfg_attr(feature = "serde-full", serde(default))]
    pub coordinates: Option<Point>,
}

impl Step {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        event: EventKind,
        bundle: LocatorBundle,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            event,
            bundle,
            value: None,
            coordinates: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_coordinates(mut self, point: Point) -> Self {
        self.coordinates = Some(point);
        self
    }
}
