//! Capture-time bundle synthesis.
//!
//! [`BundleBuilder`] turns a live node into a [`LocatorBundle`]: positional
//! XPath (always present), a best-effort CSS selector, filtered attributes,
//! a hidden-text-free snippet and the boundary chain needed to re-enter
//! nested frames and shadow roots. [`BoundaryIndex`] keeps the set of known
//! nested scopes current from mutation notices.
//!
//! [`LocatorBundle`]: soulreplay_core_types::LocatorBundle

pub mod attributes;
pub mod boundary;
mod builder;
pub mod css;
mod policy;
pub mod xpath;

pub use boundary::{boundary_chain, BoundaryIndex, IndexedScope};
pub use builder::{capture_point, BundleBuilder};
pub use policy::BuilderPolicy;
pub use xpath::positional_xpath;
