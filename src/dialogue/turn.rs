use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    Ai,
    Candidate,
}

/// One utterance in the interview transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub id: Uuid,
    pub speaker: Speaker,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// In-progress transcription, replaced until finalized
    pub is_interim: bool,
}

impl ConversationTurn {
    pub fn ai(text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            speaker: Speaker::Ai,
            text: text.into(),
            timestamp,
            is_interim: false,
        }
    }

    pub fn candidate(text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            speaker: Speaker::Candidate,
            text: text.into(),
            timestamp,
            is_interim: false,
        }
    }
}
