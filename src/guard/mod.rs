//! Screen/session guard
//!
//! Converts platform focus, visibility and keyboard signals into guard
//! events for the violation tracker. Listeners are installed once per
//! session and removed through the `GuardHandle` returned at install time.

mod guard;
pub mod remote;
pub mod signals;

pub use guard::{GuardEvent, GuardHandle, GuardSink, SessionGuard};
pub use remote::RemotePlatform;
pub use signals::{
    KeyEvent, ListenerId, PlatformEvents, PlatformSignal, SignalKind, SignalListener,
    SignalResponse,
};
