use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::audio::AudioLevelConfig;
use crate::detection::HeuristicConfig;
use crate::dialogue::DialogueConfig;
use crate::tracking::{GuardAction, TrackerPolicy};

/// Configuration for one proctored session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Unique session identifier (e.g., "session-<uuid>")
    pub session_id: String,

    /// Countdown length in seconds
    pub duration_seconds: u64,

    /// Interview script, asked in order
    pub questions: Vec<String>,

    /// Counted violations before termination
    pub max_violations: usize,

    /// Run the camera presence tick
    pub enable_face_detection: bool,

    /// Install the focus/keyboard guard
    pub enable_screen_lock: bool,

    /// Run the microphone level tick
    pub enable_audio_monitoring: bool,

    /// Advance to the next question without an explicit request
    pub auto_advance: bool,

    pub focus_loss_action: GuardAction,
    pub restricted_input_action: GuardAction,
    pub context_menu_action: GuardAction,

    /// Tick periods and detection thresholds
    pub timing: SessionTiming,

    /// Spoken after the final answer
    pub closing_message: String,
}

/// Periodic task intervals and escalation thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionTiming {
    pub detection_interval_ms: u64,
    pub audio_interval_ms: u64,
    pub timer_interval_ms: u64,
    /// Pause between an answer and the next question
    pub acknowledgement_delay_ms: u64,
    pub absence_threshold_secs: u64,
    pub look_away_threshold_secs: u64,
    pub look_away_confidence: f64,
    pub alert_cooldown_secs: u64,
    pub baseline_frames: usize,
    pub low_audio_threshold: f32,
    /// Without a new camera frame for this long the candidate counts as absent
    pub stale_frame_ms: u64,
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self {
            detection_interval_ms: 1000,
            audio_interval_ms: 100,
            timer_interval_ms: 1000,
            acknowledgement_delay_ms: 1500,
            absence_threshold_secs: 30,
            look_away_threshold_secs: 15,
            look_away_confidence: 0.4,
            alert_cooldown_secs: 3,
            baseline_frames: 3,
            low_audio_threshold: 0.1,
            stale_frame_ms: 5000,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        let policy = TrackerPolicy::default();
        Self {
            session_id: format!("session-{}", uuid::Uuid::new_v4()),
            duration_seconds: 1800, // 30 minutes
            questions: Vec::new(),
            max_violations: policy.max_violations,
            enable_face_detection: true,
            enable_screen_lock: true,
            enable_audio_monitoring: true,
            auto_advance: true,
            focus_loss_action: policy.focus_loss_action,
            restricted_input_action: policy.restricted_input_action,
            context_menu_action: policy.context_menu_action,
            timing: SessionTiming::default(),
            closing_message: DialogueConfig::default().closing_message,
        }
    }
}

impl SessionConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_seconds)
    }

    pub fn tracker_policy(&self) -> TrackerPolicy {
        TrackerPolicy {
            max_violations: self.max_violations,
            absence_threshold: Duration::from_secs(self.timing.absence_threshold_secs),
            look_away_threshold: Duration::from_secs(self.timing.look_away_threshold_secs),
            look_away_confidence: self.timing.look_away_confidence,
            alert_cooldown: Duration::from_secs(self.timing.alert_cooldown_secs),
            focus_loss_action: self.focus_loss_action,
            restricted_input_action: self.restricted_input_action,
            context_menu_action: self.context_menu_action,
        }
    }

    pub fn dialogue_config(&self) -> DialogueConfig {
        DialogueConfig {
            questions: self.questions.clone(),
            auto_advance: self.auto_advance,
            closing_message: self.closing_message.clone(),
        }
    }

    pub fn heuristic_config(&self) -> HeuristicConfig {
        HeuristicConfig {
            baseline_frames: self.timing.baseline_frames,
            ..HeuristicConfig::default()
        }
    }

    pub fn audio_config(&self) -> AudioLevelConfig {
        AudioLevelConfig {
            low_threshold: self.timing.low_audio_threshold,
            ..AudioLevelConfig::default()
        }
    }

    pub fn detection_interval(&self) -> Duration {
        Duration::from_millis(self.timing.detection_interval_ms.max(1))
    }

    pub fn audio_interval(&self) -> Duration {
        Duration::from_millis(self.timing.audio_interval_ms.max(1))
    }

    pub fn timer_interval(&self) -> Duration {
        Duration::from_millis(self.timing.timer_interval_ms.max(1))
    }

    pub fn acknowledgement_delay(&self) -> Duration {
        Duration::from_millis(self.timing.acknowledgement_delay_ms)
    }

    pub fn stale_frame_timeout(&self) -> Duration {
        Duration::from_millis(self.timing.stale_frame_ms)
    }
}
