//! Camera and microphone capture
//!
//! A session acquires one `MediaStream` at start, shares it read-only with
//! the frame and audio ticks, and stops every track on teardown.

pub mod backend;
pub mod remote;

pub use backend::{MediaBackend, MediaConstraints, MediaStream};
pub use remote::{RemoteMedia, RemoteMediaStream};
