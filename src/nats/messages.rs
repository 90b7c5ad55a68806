use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::SessionEvent;

/// Session event envelope published to `proctor.session.<id>.<event>`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEventMessage {
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: SessionEvent,
}

/// Transcript message received from STT service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptMessage {
    pub session_id: String,
    pub text: String,
    pub partial: bool,
    pub timestamp: String,
    #[serde(default)]
    pub confidence: Option<f32>,
}
