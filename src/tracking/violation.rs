use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::detection::Detection;

/// One detection tick, folded into tracker state and then discarded
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceSample {
    pub timestamp: DateTime<Utc>,
    pub presence_detected: bool,
    pub confidence: f64,
    #[serde(default)]
    pub face_count: u32,
    #[serde(default)]
    pub looking_away: bool,
}

impl FaceSample {
    pub fn from_detection(detection: Detection, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            presence_detected: detection.presence_detected,
            confidence: detection.confidence,
            face_count: detection.face_count,
            looking_away: detection.looking_away,
        }
    }

    pub fn present(timestamp: DateTime<Utc>) -> Self {
        Self::from_detection(Detection::present(0.8), timestamp)
    }

    pub fn absent(timestamp: DateTime<Utc>) -> Self {
        Self::from_detection(Detection::absent(0.1), timestamp)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    FaceAbsent,
    LookAway,
    ScreenSwitch,
    RestrictedInput,
    MultipleFaces,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Critical,
}

/// A recorded integrity-policy breach. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    /// Message shown to the candidate
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Warned,
    Terminated,
}

/// Live integrity state of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub status: SessionStatus,
    pub violation_count: usize,
    /// Start of the current continuous absence, if any
    pub away_started_at: Option<DateTime<Utc>>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            status: SessionStatus::Active,
            violation_count: 0,
            away_started_at: None,
        }
    }
}
