//! Interaction sequences dispatched once a node is resolved
//!
//! 1. click - pointer sequence at the live centre of the node
//! 2. input - focus, controlled value write, input/change/blur
//! 3. enter - Enter key pair, default submission left to the host
//! 4. navigate - direct navigation, no target node

mod click;
mod enter;
mod input;
mod navigate;

pub use click::*;
pub use enter::*;
pub use input::*;
pub use navigate::*;
