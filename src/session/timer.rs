use chrono::{DateTime, Utc};
use std::time::Duration;

/// Countdown milestones, each fired at most once per timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Warning { seconds_left: u64 },
    TimeUp,
}

/// Outcome of one tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerTick {
    pub remaining_seconds: u64,
    pub events: Vec<TimerEvent>,
}

/// Fixed-duration countdown with a single warning and a single expiry
///
/// Not restartable: a new session needs a new timer.
#[derive(Debug, Clone)]
pub struct SessionTimer {
    duration: Duration,
    started_at: DateTime<Utc>,
    warning_lead: Duration,
    warned: bool,
    expired: bool,
}

impl SessionTimer {
    pub fn new(duration: Duration, started_at: DateTime<Utc>) -> Self {
        Self {
            duration,
            started_at,
            warning_lead: Duration::from_secs(60),
            warned: false,
            expired: false,
        }
    }

    /// Override the one-minute warning lead time
    pub fn with_warning_lead(mut self, lead: Duration) -> Self {
        self.warning_lead = lead;
        self
    }

    /// Whole seconds left at `now`, rounded up
    pub fn remaining_at(&self, now: DateTime<Utc>) -> u64 {
        if self.expired {
            return 0;
        }

        let elapsed = (now - self.started_at).to_std().unwrap_or_default();
        let remaining = self.duration.saturating_sub(elapsed);
        let secs = remaining.as_secs();
        if remaining.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs
        }
    }

    pub fn tick(&mut self, now: DateTime<Utc>) -> TimerTick {
        let mut events = Vec::new();
        if self.expired {
            return TimerTick {
                remaining_seconds: 0,
                events,
            };
        }

        let remaining_seconds = self.remaining_at(now);

        if remaining_seconds == 0 {
            self.expired = true;
            events.push(TimerEvent::TimeUp);
        } else if !self.warned && remaining_seconds <= self.warning_lead.as_secs() {
            self.warned = true;
            events.push(TimerEvent::Warning {
                seconds_left: remaining_seconds,
            });
        }

        TimerTick {
            remaining_seconds,
            events,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    pub fn has_warned(&self) -> bool {
        self.warned
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}
