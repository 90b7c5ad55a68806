// Integration tests for frame-based presence detection
//
// These tests feed synthetic RGBA frames through the heuristic detector
// and check the baseline, the pre-baseline rule and the forced-absent cases.

use chrono::{Duration, TimeZone, Utc};
use interview_proctor::detection::heuristic::FrameStats;
use interview_proctor::detection::{
    FrameAnalyzer, HeuristicConfig, HeuristicFaceDetector, VideoFrame,
};
use interview_proctor::tracking::{FaceSample, TrackerPolicy, ViolationKind, ViolationTracker};
use interview_proctor::ProctorError;

const SKIN: [u8; 3] = [200, 150, 120];
const SHADOW: [u8; 3] = [30, 30, 30];
/// Hair seen from the side or behind; too little red to pass as skin
const HAIR: [u8; 3] = [120, 112, 105];

/// Skin-colored oval on a dark background, roughly where a face sits
fn face_frame(width: u32, height: u32) -> VideoFrame {
    head_frame(width, height, SKIN)
}

/// Candidate turned away: the head is still there, the face is not
fn turned_away_frame(width: u32, height: u32) -> VideoFrame {
    head_frame(width, height, HAIR)
}

fn head_frame(width: u32, height: u32, head: [u8; 3]) -> VideoFrame {
    let cx = width as f64 / 2.0;
    let cy = height as f64 * 0.4;
    let rx = width as f64 * 0.19;
    let ry = height as f64 * 0.22;

    let mut rgba = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            let dx = (x as f64 - cx) / rx;
            let dy = (y as f64 - cy) / ry;
            let [r, g, b] = if dx * dx + dy * dy <= 1.0 { head } else { SHADOW };
            rgba.extend_from_slice(&[r, g, b, 255]);
        }
    }
    VideoFrame::new(width, height, rgba)
}

#[test]
fn test_zero_dimension_frame_is_rejected() {
    let mut detector = HeuristicFaceDetector::default();
    let frame = VideoFrame::new(0, 0, Vec::new());

    let err = detector.analyze(&frame).unwrap_err();
    assert!(matches!(err, ProctorError::Detection(_)));
}

#[test]
fn test_short_buffer_is_rejected() {
    let mut detector = HeuristicFaceDetector::default();
    let frame = VideoFrame::new(8, 8, vec![0; 10]);

    assert!(matches!(
        detector.analyze(&frame),
        Err(ProctorError::Detection(_))
    ));
    assert!(detector.baseline().is_none());
}

#[test]
fn test_uniform_frame_is_absent_before_baseline() {
    let mut detector = HeuristicFaceDetector::default();
    let frame = VideoFrame::solid(64, 64, [128, 128, 128]);

    let detection = detector.analyze(&frame).unwrap();
    assert!(!detection.presence_detected);
    assert_eq!(detection.confidence, 0.2);
}

#[test]
fn test_face_frame_is_present_before_baseline() {
    let mut detector = HeuristicFaceDetector::default();

    let detection = detector.analyze(&face_frame(64, 64)).unwrap();
    assert!(detection.presence_detected);
    assert_eq!(detection.confidence, 0.6);
    assert_eq!(detection.face_count, 1);
}

#[test]
fn test_baseline_established_after_three_lit_frames() {
    let mut detector = HeuristicFaceDetector::default();
    let frame = face_frame(64, 64);

    detector.analyze(&frame).unwrap();
    detector.analyze(&frame).unwrap();
    assert!(detector.baseline().is_none());

    let detection = detector.analyze(&frame).unwrap();
    assert!(detector.baseline().is_some());

    // Still frames fail the motion criterion but four of five hold, and
    // the large skin ratio boosts confidence to the cap.
    assert!(detection.presence_detected);
    assert_eq!(detection.confidence, 0.95);
}

#[test]
fn test_dark_frames_do_not_count_toward_baseline() {
    let mut detector = HeuristicFaceDetector::default();
    let dark = VideoFrame::solid(32, 32, [10, 10, 10]);

    for _ in 0..5 {
        detector.analyze(&dark).unwrap();
    }
    assert!(detector.baseline().is_none());
}

#[test]
fn test_blank_wall_after_baseline_is_forced_absent() {
    let mut detector = HeuristicFaceDetector::default();
    let face = face_frame(64, 64);
    for _ in 0..3 {
        detector.analyze(&face).unwrap();
    }

    let wall = VideoFrame::solid(64, 64, [200, 200, 200]);
    let detection = detector.analyze(&wall).unwrap();
    assert!(!detection.presence_detected);
    assert_eq!(detection.confidence, 0.1);
}

#[test]
fn test_brightness_collapse_after_baseline_is_absent() {
    let mut detector = HeuristicFaceDetector::default();
    let face = face_frame(64, 64);
    for _ in 0..3 {
        detector.analyze(&face).unwrap();
    }

    let covered = VideoFrame::solid(64, 64, [5, 5, 5]);
    let detection = detector.analyze(&covered).unwrap();
    assert!(!detection.presence_detected);
    assert_eq!(detection.confidence, 0.1);
}

#[test]
fn test_reset_clears_baseline() {
    let mut detector = HeuristicFaceDetector::default();
    let face = face_frame(64, 64);
    for _ in 0..3 {
        detector.analyze(&face).unwrap();
    }
    assert!(detector.baseline().is_some());

    detector.reset();
    assert!(detector.baseline().is_none());

    let detection = detector.analyze(&face).unwrap();
    assert_eq!(detection.confidence, 0.6);
}

#[test]
fn test_configurable_baseline_frame_count() {
    let mut detector = HeuristicFaceDetector::new(HeuristicConfig {
        baseline_frames: 1,
        ..HeuristicConfig::default()
    });

    detector.analyze(&face_frame(48, 48)).unwrap();
    assert!(detector.baseline().is_some());
}

#[test]
fn test_classify_requires_three_criteria() {
    // Two criteria only: brightness in range and baseline deviation.
    let stats = FrameStats {
        avg_brightness: 120.0,
        skin_ratio: 0.03,
        dark_ratio: 0.06,
        motion_ratio: 0.5,
        sampled: 100,
        had_previous: true,
    };

    let detection = HeuristicFaceDetector::classify(&stats, Some(110.0));
    assert!(!detection.presence_detected);
    assert_eq!(detection.confidence, 0.4);
}

#[test]
fn test_classify_penalizes_large_baseline_deviation() {
    let stats = FrameStats {
        avg_brightness: 180.0,
        skin_ratio: 0.1,
        dark_ratio: 0.2,
        motion_ratio: 0.05,
        sampled: 100,
        had_previous: true,
    };

    // All five criteria hold (deviation 60 < 80), then x0.7 for deviation > 50.
    let detection = HeuristicFaceDetector::classify(&stats, Some(120.0));
    assert!(detection.presence_detected);
    assert_eq!(detection.confidence, 0.7);
}

#[test]
fn test_face_frame_is_not_looking_away() {
    let mut detector = HeuristicFaceDetector::default();

    let detection = detector.analyze(&face_frame(64, 64)).unwrap();
    assert!(detection.presence_detected);
    assert!(!detection.looking_away);
}

#[test]
fn test_turned_head_is_present_but_looking_away() {
    let mut detector = HeuristicFaceDetector::default();
    let face = face_frame(64, 64);
    for _ in 0..3 {
        detector.analyze(&face).unwrap();
    }

    // Brightness, contrast and baseline still match a person in the chair.
    let detection = detector.analyze(&turned_away_frame(64, 64)).unwrap();
    assert!(detection.presence_detected);
    assert!(detection.looking_away);
    assert_eq!(detection.face_count, 1);
}

#[test]
fn test_turned_head_frames_become_look_away_violation() {
    let start = Utc.with_ymd_and_hms(2025, 10, 27, 14, 30, 0).unwrap();
    let mut detector = HeuristicFaceDetector::default();
    let mut tracker = ViolationTracker::new(TrackerPolicy {
        max_violations: 10,
        ..TrackerPolicy::default()
    });

    let face = face_frame(64, 64);
    let turned = turned_away_frame(64, 64);
    for s in 0..=20 {
        let frame = if s < 3 { &face } else { &turned };
        let detection = detector.analyze(frame).unwrap();
        tracker.record_sample(&FaceSample::from_detection(
            detection,
            start + Duration::seconds(s),
        ));
    }

    // Attention window opens at 3s and closes 15s later.
    assert_eq!(tracker.violation_count(), 1);
    assert_eq!(tracker.violations()[0].kind, ViolationKind::LookAway);
    assert_eq!(tracker.violations()[0].timestamp, start + Duration::seconds(18));
    assert_eq!(tracker.state().away_started_at, None);
}
