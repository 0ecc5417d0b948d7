//! Label detection for captured elements.
//!
//! [`LabelEngine`] runs an ordered table of heuristics against a node and
//! returns the first candidate that survives sanitization. Password
//! controls are always labelled `"Password"`; numeric-only candidates fall
//! through to contextual and tag-based labels.

mod cache;
mod engine;
pub mod heuristics;
mod policy;
pub mod sanitize;

pub use cache::LabelCache;
pub use engine::{DetectedLabel, LabelEngine, PASSWORD_LABEL};
pub use heuristics::{humanize_identifier, referenced_text, LabelSource};
pub use policy::LabelPolicy;
pub use sanitize::sanitize;
