use soulreplay_core_types::NodeId;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("capture session already stopped")]
    Stopped,

    /// The interaction names a node the page no longer has
    #[error("{0} is not connected")]
    Disconnected(NodeId),

    #[error("step receiver dropped")]
    ChannelClosed,
}

impl CaptureError {
    pub fn is_retryable(&self) -> bool {
        false
    }
}
