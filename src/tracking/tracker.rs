use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

use super::violation::{FaceSample, SessionState, SessionStatus, Severity, Violation, ViolationKind};
use crate::guard::GuardEvent;

/// What a guard event does to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardAction {
    /// Record a critical violation and end the session immediately
    Terminate,
    /// Record a critical violation that counts toward `max_violations`
    Count,
    /// Suppress the platform default only; nothing is recorded
    Ignore,
}

/// Escalation thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerPolicy {
    /// Counted violations that end the session
    pub max_violations: usize,
    /// Continuous absence that makes one FaceAbsent violation
    pub absence_threshold: Duration,
    /// Continuous low-confidence presence that makes one LookAway violation
    pub look_away_threshold: Duration,
    /// Presence with confidence below this counts as looking away
    pub look_away_confidence: f64,
    /// Minimum spacing between audible alerts
    pub alert_cooldown: Duration,
    /// Tab switch, visibility loss, window blur
    pub focus_loss_action: GuardAction,
    /// Captured keyboard shortcuts
    pub restricted_input_action: GuardAction,
    /// Context menu attempts
    pub context_menu_action: GuardAction,
}

impl Default for TrackerPolicy {
    fn default() -> Self {
        Self {
            max_violations: 2,
            absence_threshold: Duration::from_secs(30),
            look_away_threshold: Duration::from_secs(15),
            look_away_confidence: 0.4,
            alert_cooldown: Duration::from_secs(3),
            focus_loss_action: GuardAction::Terminate,
            restricted_input_action: GuardAction::Count,
            context_menu_action: GuardAction::Count,
        }
    }
}

impl TrackerPolicy {
    pub fn action_for(&self, event: &GuardEvent) -> GuardAction {
        match event {
            GuardEvent::FocusLost { .. } => self.focus_loss_action,
            GuardEvent::RestrictedKey { .. } => self.restricted_input_action,
            GuardEvent::ContextMenu => self.context_menu_action,
        }
    }
}

/// Observable consequences of feeding the tracker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerEvent {
    /// Play the attention tone (already rate-limited)
    AlertTone,
    ViolationRecorded(Violation),
    /// Emitted at most once per tracker
    Terminated { reason: String },
}

/// Session integrity state machine: Active -> Warned -> Terminated
#[derive(Debug, Clone)]
pub struct ViolationTracker {
    policy: TrackerPolicy,
    state: SessionState,
    violations: Vec<Violation>,
    termination_reason: Option<String>,
    last_alert_at: Option<DateTime<Utc>>,
    look_away_started_at: Option<DateTime<Utc>>,
    multiple_faces_active: bool,
}

impl ViolationTracker {
    pub fn new(policy: TrackerPolicy) -> Self {
        Self {
            policy,
            state: SessionState::default(),
            violations: Vec::new(),
            termination_reason: None,
            last_alert_at: None,
            look_away_started_at: None,
            multiple_faces_active: false,
        }
    }

    /// Fold one detection sample into the absence/attention windows
    pub fn record_sample(&mut self, sample: &FaceSample) -> Vec<TrackerEvent> {
        let mut events = Vec::new();
        if self.is_terminated() {
            return events;
        }

        let now = sample.timestamp;

        if !sample.presence_detected {
            self.look_away_started_at = None;
            self.multiple_faces_active = false;

            match self.state.away_started_at {
                None => {
                    self.state.away_started_at = Some(now);
                    self.alert(now, &mut events);
                }
                Some(started) if elapsed(started, now) >= self.policy.absence_threshold => {
                    // New window starts where this one was counted.
                    self.state.away_started_at = Some(now);
                    self.alert(now, &mut events);
                    let message = format!(
                        "Face not detected for {} seconds - please position yourself in the camera view",
                        self.policy.absence_threshold.as_secs()
                    );
                    self.record_counted(ViolationKind::FaceAbsent, message, now, &mut events);
                }
                Some(_) => {}
            }

            return events;
        }

        // Only a real positive sample clears the absence window.
        self.state.away_started_at = None;

        if sample.face_count > 1 {
            if !self.multiple_faces_active {
                self.multiple_faces_active = true;
                let message = format!("{} faces detected in camera view", sample.face_count);
                self.record_counted(ViolationKind::MultipleFaces, message, now, &mut events);
            }
        } else {
            self.multiple_faces_active = false;
        }

        if self.is_terminated() {
            return events;
        }

        if sample.looking_away || sample.confidence < self.policy.look_away_confidence {
            match self.look_away_started_at {
                None => self.look_away_started_at = Some(now),
                Some(started) if elapsed(started, now) >= self.policy.look_away_threshold => {
                    self.look_away_started_at = Some(now);
                    self.alert(now, &mut events);
                    let message = format!(
                        "Looking away from the screen for {} seconds",
                        self.policy.look_away_threshold.as_secs()
                    );
                    self.record_counted(ViolationKind::LookAway, message, now, &mut events);
                }
                Some(_) => {}
            }
        } else {
            self.look_away_started_at = None;
        }

        events
    }

    /// Apply a guard event according to the configured action
    pub fn record_guard(&mut self, event: &GuardEvent, now: DateTime<Utc>) -> Vec<TrackerEvent> {
        let mut events = Vec::new();
        if self.is_terminated() {
            return events;
        }

        let kind = match event {
            GuardEvent::FocusLost { .. } => ViolationKind::ScreenSwitch,
            GuardEvent::RestrictedKey { .. } | GuardEvent::ContextMenu => {
                ViolationKind::RestrictedInput
            }
        };

        match self.policy.action_for(event) {
            GuardAction::Ignore => {
                info!("Guard event ignored by policy: {}", event.describe());
            }
            GuardAction::Count => {
                self.push_violation(kind, Severity::Critical, event.describe(), now, &mut events);
                self.escalate(kind, &mut events);
            }
            GuardAction::Terminate => {
                self.push_violation(kind, Severity::Critical, event.describe(), now, &mut events);
                let reason = format!("Session terminated: {}", event.describe());
                events.extend(self.terminate(reason));
            }
        }

        events
    }

    /// End the session. A second call is a no-op and returns `None`.
    pub fn terminate(&mut self, reason: impl Into<String>) -> Option<TrackerEvent> {
        if self.is_terminated() {
            return None;
        }

        let reason = reason.into();
        warn!("Session terminated: {}", reason);

        self.state.status = SessionStatus::Terminated;
        self.state.away_started_at = None;
        self.termination_reason = Some(reason.clone());

        Some(TrackerEvent::Terminated { reason })
    }

    fn record_counted(
        &mut self,
        kind: ViolationKind,
        message: String,
        now: DateTime<Utc>,
        events: &mut Vec<TrackerEvent>,
    ) {
        let severity = if self.state.violation_count + 1 >= self.policy.max_violations {
            Severity::Critical
        } else {
            Severity::Warning
        };
        self.push_violation(kind, severity, message, now, events);
        self.escalate(kind, events);
    }

    fn push_violation(
        &mut self,
        kind: ViolationKind,
        severity: Severity,
        message: String,
        now: DateTime<Utc>,
        events: &mut Vec<TrackerEvent>,
    ) {
        let violation = Violation {
            kind,
            timestamp: now,
            severity,
            message,
        };

        self.violations.push(violation.clone());
        self.state.violation_count = self.violations.len();
        if self.state.status == SessionStatus::Active {
            self.state.status = SessionStatus::Warned;
        }

        info!(
            "Violation recorded: {:?} ({:?}) - {}/{}",
            kind, severity, self.state.violation_count, self.policy.max_violations
        );

        events.push(TrackerEvent::ViolationRecorded(violation));
    }

    fn escalate(&mut self, last: ViolationKind, events: &mut Vec<TrackerEvent>) {
        if self.state.violation_count < self.policy.max_violations {
            return;
        }

        let reason = format!(
            "Session terminated: {} ({}/{} violations)",
            describe_kind(last),
            self.state.violation_count,
            self.policy.max_violations
        );
        events.extend(self.terminate(reason));
    }

    fn alert(&mut self, now: DateTime<Utc>, events: &mut Vec<TrackerEvent>) {
        let ready = self
            .last_alert_at
            .map_or(true, |last| elapsed(last, now) >= self.policy.alert_cooldown);

        if ready {
            self.last_alert_at = Some(now);
            events.push(TrackerEvent::AlertTone);
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn status(&self) -> SessionStatus {
        self.state.status
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn violation_count(&self) -> usize {
        self.state.violation_count
    }

    pub fn termination_reason(&self) -> Option<&str> {
        self.termination_reason.as_deref()
    }

    pub fn is_terminated(&self) -> bool {
        self.state.status == SessionStatus::Terminated
    }

    pub fn policy(&self) -> &TrackerPolicy {
        &self.policy
    }
}

fn elapsed(since: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (now - since).to_std().unwrap_or_default()
}

fn describe_kind(kind: ViolationKind) -> &'static str {
    match kind {
        ViolationKind::FaceAbsent => "face not detected repeatedly",
        ViolationKind::LookAway => "looked away from the screen repeatedly",
        ViolationKind::ScreenSwitch => "switched away from the session",
        ViolationKind::RestrictedInput => "used restricted shortcuts",
        ViolationKind::MultipleFaces => "multiple faces detected",
    }
}
