//! Host capability ports for the SoulReplay engine.
//!
//! A hosting environment (browser bridge, headless DOM, test fixture) exposes
//! a document through these traits; the capture and replay crates depend on
//! nothing else. [`MemoryPage`] is the bundled in-memory implementation.

pub mod clock;
pub mod errors;
pub mod memory;
pub mod ports;

pub use clock::TokioClock;
pub use errors::HostError;
pub use memory::{HostRecord, MemoryPage, NodeSpec, PageFixture, StyleSpec};
pub use ports::{
    collect_text, Clock, ControlState, ControlValue, DispatchOutcome, DocumentAccessor,
    EventDispatcher, EventName, KeyMod, MutationNotice, MutationStream, NodeInspector, PageView,
    ReplayHost, Selector, SyntheticEvent, TimerHandle, TimerTask, Visibility,
};
