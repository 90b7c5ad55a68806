use serde::{Deserialize, Serialize};

use super::frame::VideoFrame;
use crate::error::ProctorResult;

/// Result of analyzing a single frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Whether a candidate appears to be in front of the camera
    pub presence_detected: bool,
    /// Estimator confidence (0.0 to 1.0)
    pub confidence: f64,
    /// Number of faces seen; heuristic detectors report 0 or 1
    pub face_count: u32,
    /// Present but not facing the screen
    #[serde(default)]
    pub looking_away: bool,
}

impl Detection {
    pub fn present(confidence: f64) -> Self {
        Self {
            presence_detected: true,
            confidence,
            face_count: 1,
            looking_away: false,
        }
    }

    /// Present, with too little of the face toward the camera
    pub fn looking_away(confidence: f64) -> Self {
        Self {
            looking_away: true,
            ..Self::present(confidence)
        }
    }

    pub fn absent(confidence: f64) -> Self {
        Self {
            presence_detected: false,
            confidence,
            face_count: 0,
            looking_away: false,
        }
    }
}

/// Presence detector trait
///
/// Implementations:
/// - `HeuristicFaceDetector`: pixel statistics with a brightness baseline
/// - anything else honoring the same contract (e.g. an ML model)
///
/// Analyzers are stateful (baselines, previous frame) and are owned by a
/// single session, so `analyze` takes `&mut self`.
pub trait FrameAnalyzer: Send {
    /// Estimate presence for one frame
    fn analyze(&mut self, frame: &VideoFrame) -> ProctorResult<Detection>;

    /// Forget all per-session state
    fn reset(&mut self);

    /// Analyzer name for logging
    fn name(&self) -> &str;
}
