//! Capture session: throttling, debouncing and step emission while recording.

pub mod debounce;
pub mod errors;
pub mod events;
pub mod policy;
pub mod session;
pub mod throttle;

pub use debounce::Debouncer;
pub use errors::CaptureError;
pub use events::{Disposition, RawInteraction};
pub use policy::CapturePolicy;
pub use session::CaptureSession;
pub use throttle::Throttle;
