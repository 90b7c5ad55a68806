//! Proctored session orchestration
//!
//! A session owns one of each component and runs them on a single task:
//! - Frame analysis and the violation tracker (presence ticks)
//! - Audio level monitoring
//! - The session guard (focus and keyboard listeners)
//! - The countdown timer
//! - The interview dialogue and its speech engines
//!
//! Every exit path (completion, time-up, violation termination, forced end,
//! dropped handle) runs the same teardown and produces one `SessionResult`.

mod config;
mod events;
mod session;
mod stats;
mod timer;

pub use config::{SessionConfig, SessionTiming};
pub use events::{ChannelEventSink, SessionEvent, SessionEventSink};
pub use session::{start_session, SessionCollaborators, SessionCommand, SessionHandle};
pub use stats::{SessionResult, SessionSnapshot};
pub use timer::{SessionTimer, TimerEvent, TimerTick};
