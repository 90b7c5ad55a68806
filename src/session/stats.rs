use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dialogue::{ConversationTurn, DialogueState, Floor};
use crate::tracking::{FaceSample, SessionState, Violation};

/// Terminal snapshot of a session, created exactly once
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResult {
    pub session_id: String,

    /// Candidate answers accepted
    pub questions_answered: usize,

    pub total_questions: usize,

    /// Wall-clock session length
    pub duration_seconds: u64,

    /// Every recorded violation, in order
    pub violations: Vec<Violation>,

    /// Permanent conversation turns, in order
    pub turns: Vec<ConversationTurn>,

    /// `None` when the interview completed naturally
    pub termination_reason: Option<String>,

    pub started_at: DateTime<Utc>,

    pub ended_at: DateTime<Utc>,
}

impl SessionResult {
    pub fn completed(&self) -> bool {
        self.termination_reason.is_none()
    }
}

/// Live, read-only view of a running session for UI reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub state: SessionState,
    pub dialogue: DialogueState,
    pub floor: Floor,
    pub input_enabled: bool,
    pub questions_answered: usize,
    pub total_questions: usize,
    pub remaining_seconds: u64,
    pub audio_level: f32,
    pub last_sample: Option<FaceSample>,
    /// Whether camera/microphone are being captured
    pub media_active: bool,
    pub ended: bool,
}
