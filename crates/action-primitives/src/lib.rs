//! Replay action executor
//!
//! Executes one captured [`Step`](soulreplay_core_types::Step) at a time:
//! - resolves the target through the locator's strategy chain
//! - dispatches the interaction sequence for the step's event kind
//! - optionally verifies a kind-dependent post-condition
//! - reports a [`StepResult`] with a classified [`FailureReason`]

pub mod errors;
mod executor;
pub mod policy;
mod primitives;
pub mod types;
mod verify;

pub use errors::*;
pub use executor::*;
pub use policy::ExecutorPolicy;
pub use primitives::*;
pub use types::*;
pub use verify::*;
