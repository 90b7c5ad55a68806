use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::stats::SessionResult;
use crate::dialogue::ConversationTurn;
use crate::tracking::Violation;

/// Streamed session update for the surrounding application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A permanent turn was appended
    TurnAdded { turn: ConversationTurn },
    /// The interim transcription placeholder changed
    TurnUpdated { turn: ConversationTurn },
    Violation { violation: Violation },
    /// Play the attention tone
    Alert,
    TimerWarning { seconds_left: u64 },
    /// Benign "continuing without X" style message
    Notice { message: String },
    /// Emitted exactly once per session
    SessionEnded { result: SessionResult },
}

impl SessionEvent {
    /// Short name used in topics and logs
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::TurnAdded { .. } => "turn_added",
            SessionEvent::TurnUpdated { .. } => "turn_updated",
            SessionEvent::Violation { .. } => "violation",
            SessionEvent::Alert => "alert",
            SessionEvent::TimerWarning { .. } => "timer_warning",
            SessionEvent::Notice { .. } => "notice",
            SessionEvent::SessionEnded { .. } => "session_ended",
        }
    }
}

/// Receiver of session updates
pub trait SessionEventSink: Send + Sync {
    fn emit(&self, event: SessionEvent);
}

/// Forwards events into an unbounded channel
#[derive(Clone)]
pub struct ChannelEventSink {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl ChannelEventSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl SessionEventSink for ChannelEventSink {
    fn emit(&self, event: SessionEvent) {
        // Receiver gone means nobody is listening anymore.
        let _ = self.tx.send(event);
    }
}
