use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

use crate::http::SessionRetention;
use crate::session::{SessionConfig, SessionTiming};
use crate::tracking::GuardAction;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    #[serde(default)]
    pub nats: NatsConfig,
    #[serde(default)]
    pub proctoring: ProctoringConfig,
    #[serde(default)]
    pub interview: InterviewConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
    #[serde(default)]
    pub retention: RetentionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

/// Ended sessions kept in memory for result queries
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    pub max_ended_sessions: usize,
    pub ended_ttl_secs: u64,
    /// How often the background sweep runs
    pub sweep_interval_secs: u64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        let retention = SessionRetention::default();
        Self {
            max_ended_sessions: retention.max_ended,
            ended_ttl_secs: retention.ttl.as_secs(),
            sweep_interval_secs: 60,
        }
    }
}

impl RetentionConfig {
    pub fn policy(&self) -> SessionRetention {
        SessionRetention {
            max_ended: self.max_ended_sessions,
            ttl: Duration::from_secs(self.ended_ttl_secs),
        }
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NatsConfig {
    /// Publish session events and take transcripts from the STT service
    pub enabled: bool,
    pub url: String,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: "nats://localhost:4222".to_string(),
        }
    }
}

/// Integrity policy applied to every new session
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProctoringConfig {
    pub max_violations: usize,
    pub absence_threshold_secs: u64,
    pub look_away_threshold_secs: u64,
    pub look_away_confidence: f64,
    pub alert_cooldown_secs: u64,
    pub detection_interval_ms: u64,
    pub audio_interval_ms: u64,
    pub low_audio_threshold: f32,
    pub baseline_frames: usize,
    pub stale_frame_ms: u64,
    pub focus_loss_action: GuardAction,
    pub restricted_input_action: GuardAction,
    pub context_menu_action: GuardAction,
}

impl Default for ProctoringConfig {
    fn default() -> Self {
        let session = SessionConfig::default();
        let timing = SessionTiming::default();
        Self {
            max_violations: session.max_violations,
            absence_threshold_secs: timing.absence_threshold_secs,
            look_away_threshold_secs: timing.look_away_threshold_secs,
            look_away_confidence: timing.look_away_confidence,
            alert_cooldown_secs: timing.alert_cooldown_secs,
            detection_interval_ms: timing.detection_interval_ms,
            audio_interval_ms: timing.audio_interval_ms,
            low_audio_threshold: timing.low_audio_threshold,
            baseline_frames: timing.baseline_frames,
            stale_frame_ms: timing.stale_frame_ms,
            focus_loss_action: session.focus_loss_action,
            restricted_input_action: session.restricted_input_action,
            context_menu_action: session.context_menu_action,
        }
    }
}

/// Interview defaults for sessions started without their own script
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InterviewConfig {
    pub duration_seconds: u64,
    pub questions: Vec<String>,
    pub auto_advance: bool,
    pub acknowledgement_delay_ms: u64,
    pub closing_message: String,
}

impl Default for InterviewConfig {
    fn default() -> Self {
        let session = SessionConfig::default();
        Self {
            duration_seconds: session.duration_seconds,
            questions: session.questions,
            auto_advance: session.auto_advance,
            acknowledgement_delay_ms: session.timing.acknowledgement_delay_ms,
            closing_message: session.closing_message,
        }
    }
}

impl Config {
    /// Load `path` (extension optional) and overlay `PROCTOR__*` variables
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(
                config::Environment::with_prefix("PROCTOR")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read config {}", path))?;

        settings
            .try_deserialize()
            .context("Invalid proctor configuration")
    }

    /// Session template built from the configured policy and interview
    pub fn session_defaults(&self) -> SessionConfig {
        let p = &self.proctoring;
        let i = &self.interview;
        SessionConfig {
            duration_seconds: i.duration_seconds,
            questions: i.questions.clone(),
            max_violations: p.max_violations,
            auto_advance: i.auto_advance,
            focus_loss_action: p.focus_loss_action,
            restricted_input_action: p.restricted_input_action,
            context_menu_action: p.context_menu_action,
            timing: SessionTiming {
                detection_interval_ms: p.detection_interval_ms,
                audio_interval_ms: p.audio_interval_ms,
                acknowledgement_delay_ms: i.acknowledgement_delay_ms,
                absence_threshold_secs: p.absence_threshold_secs,
                look_away_threshold_secs: p.look_away_threshold_secs,
                look_away_confidence: p.look_away_confidence,
                alert_cooldown_secs: p.alert_cooldown_secs,
                baseline_frames: p.baseline_frames,
                stale_frame_ms: p.stale_frame_ms,
                low_audio_threshold: p.low_audio_threshold,
                ..SessionTiming::default()
            },
            closing_message: i.closing_message.clone(),
            ..SessionConfig::default()
        }
    }
}
