use serde::{Deserialize, Serialize};

/// Low-audio transitions worth telling the candidate about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioNotice {
    Low,
    Restored,
}

/// Configuration for the audio level monitor
#[derive(Debug, Clone)]
pub struct AudioLevelConfig {
    /// Mean bin magnitude that maps to full scale
    pub reference: f32,
    /// Levels below this are reported as low audio
    pub low_threshold: f32,
}

impl Default for AudioLevelConfig {
    fn default() -> Self {
        Self {
            reference: 128.0,
            low_threshold: 0.1,
        }
    }
}

/// Normalized microphone level from frequency-domain analysis ticks
///
/// Informational only: levels drive the UI indicator and the low-audio
/// notice, never a violation.
#[derive(Debug, Clone)]
pub struct AudioLevelMonitor {
    config: AudioLevelConfig,
    level: f32,
    low: bool,
}

impl Default for AudioLevelMonitor {
    fn default() -> Self {
        Self::new(AudioLevelConfig::default())
    }
}

impl AudioLevelMonitor {
    pub fn new(config: AudioLevelConfig) -> Self {
        Self {
            config,
            level: 0.0,
            low: false,
        }
    }

    /// Mean of the byte frequency bins over the reference, clamped to 1
    pub fn level_of(bins: &[u8], reference: f32) -> f32 {
        if bins.is_empty() || reference <= 0.0 {
            return 0.0;
        }

        let sum: u64 = bins.iter().map(|&b| b as u64).sum();
        let average = sum as f32 / bins.len() as f32;
        (average / reference).clamp(0.0, 1.0)
    }

    /// Process one analysis tick and return the normalized level
    pub fn sample(&mut self, bins: &[u8]) -> f32 {
        self.level = Self::level_of(bins, self.config.reference);
        self.level
    }

    /// Process one tick and report a low-audio edge, if one occurred
    pub fn observe(&mut self, bins: &[u8]) -> (f32, Option<AudioNotice>) {
        let level = self.sample(bins);
        let now_low = level < self.config.low_threshold;

        let notice = match (self.low, now_low) {
            (false, true) => Some(AudioNotice::Low),
            (true, false) => Some(AudioNotice::Restored),
            _ => None,
        };
        self.low = now_low;

        (level, notice)
    }

    /// Last computed level
    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn is_low(&self) -> bool {
        self.low
    }
}
