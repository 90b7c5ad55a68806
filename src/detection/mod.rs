//! Presence estimation from raw video frames
//!
//! The session only depends on the `FrameAnalyzer` trait. The bundled
//! `HeuristicFaceDetector` is a cheap pixel-statistics estimator; any
//! detector producing a `Detection` can replace it.

pub mod analyzer;
pub mod frame;
pub mod heuristic;

pub use analyzer::{Detection, FrameAnalyzer};
pub use frame::VideoFrame;
pub use heuristic::{HeuristicConfig, HeuristicFaceDetector};
