//! Enter primitive

use page_host::{EventName, ReplayHost, SyntheticEvent};
use soulreplay_core_types::NodeId;
use tracing::debug;

use crate::{errors::ActionError, types::ExecCtx};

pub const ENTER_KEY: &str = "Enter";

/// Focus the node and press Enter on it.
///
/// Default form submission is the host's business; a page handler that
/// prevents it is only logged.
pub async fn execute_enter<H>(host: &H, ctx: &ExecCtx, node: NodeId) -> Result<(), ActionError>
where
    H: ReplayHost + ?Sized,
{
    host.focus(node).await?;
    for name in [EventName::KeyDown, EventName::KeyUp] {
        if ctx.is_cancelled() {
            return Err(ActionError::Cancelled);
        }
        let outcome = host
            .dispatch(node, SyntheticEvent::new(name).with_key(ENTER_KEY))
            .await?;
        if outcome.default_prevented {
            debug!(action_id = %ctx.action_id, %node, event = name.name(), "enter default prevented by page");
        }
    }
    Ok(())
}
