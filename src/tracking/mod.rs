//! Violation accumulation and escalation
//!
//! `ViolationTracker` is the single writer of `SessionState`. It folds face
//! samples and guard events into an ordered violation list and decides,
//! exactly once, when the session must terminate.

mod tracker;
mod violation;

pub use tracker::{GuardAction, TrackerEvent, TrackerPolicy, ViolationTracker};
pub use violation::{FaceSample, SessionState, SessionStatus, Severity, Violation, ViolationKind};
