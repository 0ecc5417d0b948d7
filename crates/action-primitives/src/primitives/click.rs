//! Click primitive

use page_host::{EventName, ReplayHost, SyntheticEvent};
use soulreplay_core_types::{NodeId, Point};
use tracing::debug;

use crate::{errors::ActionError, types::ExecCtx};

/// Pointer events of a click, in dispatch order.
pub const CLICK_SEQUENCE: [EventName; 5] = [
    EventName::PointerEnter,
    EventName::PointerOver,
    EventName::PointerDown,
    EventName::PointerUp,
    EventName::Click,
];

/// Dispatch the pointer sequence at the node's current centre.
///
/// Captured coordinates are never reused; the rectangle is read again so a
/// relocated node is hit where it is now.
pub async fn execute_click<H>(host: &H, ctx: &ExecCtx, node: NodeId) -> Result<(), ActionError>
where
    H: ReplayHost + ?Sized,
{
    let point = live_center(host, node);
    debug!(action_id = %ctx.action_id, %node, ?point, "dispatching click sequence");
    for name in CLICK_SEQUENCE {
        if ctx.is_cancelled() {
            return Err(ActionError::Cancelled);
        }
        host.dispatch(node, SyntheticEvent::new(name).at(point)).await?;
    }
    Ok(())
}

pub fn live_center<H: ReplayHost + ?Sized>(host: &H, node: NodeId) -> Option<Point> {
    host.bounding_rect(node)
        .filter(|rect| !rect.is_empty())
        .map(|rect| rect.center())
}
