//! Kind-dependent post-conditions.

use page_host::{ControlValue, ReplayHost};
use soulreplay_core_types::NodeId;

use crate::types::Verification;

/// The control now holds what was written.
pub fn verify_value<H: ReplayHost + ?Sized>(
    host: &H,
    node: NodeId,
    written: &ControlValue,
) -> Verification {
    let state = host.control_state(node);
    let (expected, actual) = match written {
        ControlValue::Text(text) | ControlValue::Selected(text) => {
            (text.clone(), state.value.unwrap_or_default())
        }
        ControlValue::Checked(checked) => (
            checked.to_string(),
            state.checked.unwrap_or(false).to_string(),
        ),
    };
    compare(expected, actual)
}

/// The host now reports the requested URL.
pub fn verify_url<H: ReplayHost + ?Sized>(host: &H, url: &str) -> Verification {
    compare(url.to_string(), host.current_url().unwrap_or_default())
}

fn compare(expected: String, actual: String) -> Verification {
    if expected == actual {
        Verification::Passed
    } else {
        Verification::Failed { expected, actual }
    }
}
