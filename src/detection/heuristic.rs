use tracing::debug;

use super::analyzer::{Detection, FrameAnalyzer};
use super::frame::VideoFrame;
use crate::error::{ProctorError, ProctorResult};

/// Tuning for the pixel heuristic
#[derive(Debug, Clone)]
pub struct HeuristicConfig {
    /// Sample every Nth pixel in each direction
    pub stride: u32,
    /// Number of lit frames averaged into the brightness baseline
    pub baseline_frames: usize,
    /// Frames darker than this never contribute to the baseline
    pub baseline_brightness_floor: f64,
    /// A present candidate showing less skin than this is looking away
    pub look_away_skin_ratio: f64,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            stride: 2,
            baseline_frames: 3,
            baseline_brightness_floor: 30.0,
            look_away_skin_ratio: 0.06,
        }
    }
}

/// Pixel statistics over the sampled face region
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameStats {
    pub avg_brightness: f64,
    pub skin_ratio: f64,
    pub dark_ratio: f64,
    pub motion_ratio: f64,
    pub sampled: usize,
    /// Whether a comparable previous frame existed for motion
    pub had_previous: bool,
}

/// Brightness of the sampled pixels of the last frame, in sampling order
struct PreviousFrame {
    width: u32,
    height: u32,
    brightness: Vec<f64>,
}

/// Presence estimator based on skin tone, contrast, motion and brightness
///
/// Samples an ellipse where a seated candidate's face normally is, builds a
/// brightness baseline from the opening frames and then scores each frame
/// against five criteria.
pub struct HeuristicFaceDetector {
    config: HeuristicConfig,
    previous: Option<PreviousFrame>,
    baseline_sum: f64,
    baseline_count: usize,
    baseline: Option<f64>,
}

impl Default for HeuristicFaceDetector {
    fn default() -> Self {
        Self::new(HeuristicConfig::default())
    }
}

impl HeuristicFaceDetector {
    pub fn new(config: HeuristicConfig) -> Self {
        Self {
            config,
            previous: None,
            baseline_sum: 0.0,
            baseline_count: 0,
            baseline: None,
        }
    }

    /// Established baseline brightness, if any
    pub fn baseline(&self) -> Option<f64> {
        self.baseline
    }

    /// Sample the face ellipse and collect statistics
    ///
    /// Stores this frame's sampled brightness for the next motion comparison.
    pub fn measure(&mut self, frame: &VideoFrame) -> ProctorResult<FrameStats> {
        frame.validate()?;

        let width = frame.width as f64;
        let height = frame.height as f64;
        let center_x = width / 2.0;
        let center_y = height * 0.4;
        let radius_x = width * 0.25;
        let radius_y = height * 0.3;

        let y_start = (center_y - radius_y).max(0.0).ceil() as u32;
        let y_end = (center_y + radius_y).min(height - 1.0).floor() as u32;
        let x_start = (center_x - radius_x).max(0.0).ceil() as u32;
        let x_end = (center_x + radius_x).min(width - 1.0).floor() as u32;
        let stride = self.config.stride.max(1) as usize;

        let previous = self
            .previous
            .take()
            .filter(|p| p.width == frame.width && p.height == frame.height);

        let mut brightness_samples = Vec::new();
        let mut total_brightness = 0.0;
        let mut skin = 0usize;
        let mut dark = 0usize;
        let mut motion = 0usize;

        for y in (y_start..=y_end).step_by(stride) {
            for x in (x_start..=x_end).step_by(stride) {
                let dx = (x as f64 - center_x) / radius_x;
                let dy = (y as f64 - center_y) / radius_y;
                if dx * dx + dy * dy > 1.0 {
                    continue;
                }

                let (r, g, b) = frame.rgb_at(x, y);
                let brightness = (r + g + b) / 3.0;

                if is_skin_tone(r, g, b, brightness) {
                    skin += 1;
                }
                if brightness < 80.0 {
                    dark += 1;
                }
                if let Some(prev) = previous
                    .as_ref()
                    .and_then(|p| p.brightness.get(brightness_samples.len()))
                {
                    if (brightness - prev).abs() > 15.0 {
                        motion += 1;
                    }
                }

                total_brightness += brightness;
                brightness_samples.push(brightness);
            }
        }

        let sampled = brightness_samples.len();
        if sampled == 0 {
            return Err(ProctorError::Detection(format!(
                "no pixels inside sampling region of {}x{} frame",
                frame.width, frame.height
            )));
        }

        let had_previous = previous.is_some();
        self.previous = Some(PreviousFrame {
            width: frame.width,
            height: frame.height,
            brightness: brightness_samples,
        });

        let n = sampled as f64;
        Ok(FrameStats {
            avg_brightness: total_brightness / n,
            skin_ratio: skin as f64 / n,
            dark_ratio: dark as f64 / n,
            motion_ratio: motion as f64 / n,
            sampled,
            had_previous,
        })
    }

    fn update_baseline(&mut self, avg_brightness: f64) {
        if self.baseline.is_some() || avg_brightness <= self.config.baseline_brightness_floor {
            return;
        }

        self.baseline_sum += avg_brightness;
        self.baseline_count += 1;

        if self.baseline_count >= self.config.baseline_frames.max(1) {
            let baseline = self.baseline_sum / self.baseline_count as f64;
            debug!("Brightness baseline established at {:.1}", baseline);
            self.baseline = Some(baseline);
        }
    }

    /// Score statistics and flag a present candidate showing too little skin
    pub fn assess(&self, stats: &FrameStats) -> Detection {
        let detection = Self::classify(stats, self.baseline);
        if detection.presence_detected && stats.skin_ratio < self.config.look_away_skin_ratio {
            debug!(
                "Skin ratio {:.3} below {:.3}, candidate looking away",
                stats.skin_ratio, self.config.look_away_skin_ratio
            );
            return Detection::looking_away(detection.confidence);
        }
        detection
    }

    /// Score statistics against the established baseline
    pub fn classify(stats: &FrameStats, baseline: Option<f64>) -> Detection {
        let Some(baseline) = baseline else {
            let basic = stats.avg_brightness > 60.0
                && stats.skin_ratio > 0.05
                && stats.dark_ratio > 0.05;
            return if basic {
                Detection::present(0.6)
            } else {
                Detection::absent(0.2)
            };
        };

        let deviation = (stats.avg_brightness - baseline).abs();
        let criteria = [
            stats.avg_brightness > 40.0 && stats.avg_brightness < 220.0,
            stats.skin_ratio > 0.08,
            stats.dark_ratio > 0.1 && stats.dark_ratio < 0.7,
            !stats.had_previous || (stats.motion_ratio > 0.01 && stats.motion_ratio < 0.3),
            deviation < 80.0,
        ];
        let satisfied = criteria.iter().filter(|c| **c).count();

        let mut present = satisfied >= 3;
        let mut confidence = satisfied as f64 / criteria.len() as f64;

        if stats.skin_ratio > 0.15 {
            confidence = (confidence + 0.2).min(0.95);
        }
        if deviation > 50.0 {
            confidence *= 0.7;
        }

        // Subject walked away, or the camera sees a blank background.
        if stats.avg_brightness < baseline * 0.3
            || (stats.skin_ratio < 0.02 && stats.dark_ratio < 0.05)
        {
            present = false;
            confidence = 0.1;
        }

        let confidence = (confidence * 100.0).round() / 100.0;
        if present {
            Detection::present(confidence)
        } else {
            Detection::absent(confidence)
        }
    }
}

impl FrameAnalyzer for HeuristicFaceDetector {
    fn analyze(&mut self, frame: &VideoFrame) -> ProctorResult<Detection> {
        let stats = self.measure(frame)?;
        self.update_baseline(stats.avg_brightness);
        Ok(self.assess(&stats))
    }

    fn reset(&mut self) {
        self.previous = None;
        self.baseline_sum = 0.0;
        self.baseline_count = 0;
        self.baseline = None;
    }

    fn name(&self) -> &str {
        "heuristic"
    }
}

/// Red-dominant, mid-brightness pixels
fn is_skin_tone(r: f64, g: f64, b: f64, brightness: f64) -> bool {
    r > 60.0
        && g > 40.0
        && b > 20.0
        && r > g
        && r > b
        && r - g > 10.0
        && r - b > 15.0
        && brightness > 70.0
        && brightness < 200.0
}
