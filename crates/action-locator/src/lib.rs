//! Locator - strategy-ordered element resolution
//!
//! Replays a captured [`LocatorBundle`](soulreplay_core_types::LocatorBundle)
//! against the live document:
//! - boundary re-descent into the recorded iframe / shadow scope
//! - nine strategies tried in priority order, first visible match wins
//! - class/attribute overlap tie-break, then document order
//! - bounded polling until the timeout or cancellation

pub mod errors;
pub mod policy;
pub mod resolver;
pub mod scope;
pub mod strategies;
pub mod types;

pub use errors::*;
pub use policy::FinderPolicy;
pub use resolver::*;
pub use scope::{descend, Descent};
pub use strategies::{evaluate, is_visible, strategy_fn, tie_break, StrategyFn, StrategyInput};
pub use types::*;
