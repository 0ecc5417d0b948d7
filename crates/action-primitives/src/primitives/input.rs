//! Input primitive - text, select, checkbox and radio controls

use page_host::{ControlValue, EventName, ReplayHost, SyntheticEvent};
use soulreplay_core_types::NodeId;
use tracing::debug;

use crate::{errors::ActionError, types::ExecCtx};

/// Notifications emitted after the value write, in order.
pub const INPUT_SEQUENCE: [EventName; 3] = [EventName::Input, EventName::Change, EventName::Blur];

/// Kind of form control, decided from the live node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    Text,
    Select,
    Checkbox,
    Radio,
}

impl ControlKind {
    pub fn of<H: ReplayHost + ?Sized>(host: &H, node: NodeId) -> Self {
        let tag = host.tag_name(node).unwrap_or_default();
        if tag == "select" {
            return ControlKind::Select;
        }
        if tag != "input" {
            return ControlKind::Text;
        }
        match host
            .attribute(node, "type")
            .map(|t| t.trim().to_ascii_lowercase())
            .as_deref()
        {
            Some("checkbox") => ControlKind::Checkbox,
            Some("radio") => ControlKind::Radio,
            _ => ControlKind::Text,
        }
    }
}

/// Checked state recorded for a checkbox step. A missing value means "check".
pub fn parse_checked(value: Option<&str>) -> bool {
    match value.map(|v| v.trim().to_ascii_lowercase()) {
        None => true,
        Some(v) => !matches!(v.as_str(), "false" | "off" | "0" | "no" | "unchecked" | ""),
    }
}

/// Value to write for `kind`.
pub fn control_value(kind: ControlKind, value: Option<&str>) -> ControlValue {
    match kind {
        ControlKind::Text => ControlValue::Text(value.unwrap_or_default().to_string()),
        ControlKind::Select => ControlValue::Selected(value.unwrap_or_default().to_string()),
        ControlKind::Checkbox => ControlValue::Checked(parse_checked(value)),
        // Replaying a radio interaction always selects it.
        ControlKind::Radio => ControlValue::Checked(true),
    }
}

/// Focus, write through the controlled-value channel, then notify.
pub async fn execute_input<H>(
    host: &H,
    ctx: &ExecCtx,
    node: NodeId,
    value: Option<&str>,
) -> Result<ControlValue, ActionError>
where
    H: ReplayHost + ?Sized,
{
    let kind = ControlKind::of(host, node);
    let written = control_value(kind, value);
    debug!(action_id = %ctx.action_id, %node, ?kind, "writing control value");

    host.focus(node).await?;
    host.set_controlled_value(node, &written).await?;
    for name in INPUT_SEQUENCE {
        if ctx.is_cancelled() {
            return Err(ActionError::Cancelled);
        }
        host.dispatch(node, SyntheticEvent::new(name)).await?;
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkbox_values() {
        assert!(parse_checked(None));
        assert!(parse_checked(Some("on")));
        assert!(parse_checked(Some("TRUE")));
        assert!(!parse_checked(Some("false")));
        assert!(!parse_checked(Some(" off ")));
        assert!(!parse_checked(Some("")));
    }

    #[test]
    fn radio_always_checks() {
        assert_eq!(
            control_value(ControlKind::Radio, Some("false")),
            ControlValue::Checked(true)
        );
        assert_eq!(
            control_value(ControlKind::Text, None),
            ControlValue::Text(String::new())
        );
    }
}
