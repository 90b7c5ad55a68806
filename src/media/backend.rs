use std::sync::Arc;

use crate::detection::VideoFrame;
use crate::error::ProctorResult;

/// Which tracks to request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaConstraints {
    pub video: bool,
    pub audio: bool,
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            video: true,
            audio: true,
        }
    }
}

/// Live capture stream shared by the detection and audio ticks
pub trait MediaStream: Send + Sync {
    /// Latest video frame, if the stream has one ready
    fn capture_frame(&self) -> Option<VideoFrame>;

    /// Latest byte frequency-domain analysis of the microphone
    fn frequency_data(&self) -> Option<Vec<u8>>;

    fn has_video(&self) -> bool;

    fn has_audio(&self) -> bool;

    /// Stop every track; idempotent
    fn stop_all(&self);

    /// Tracks still capturing
    fn live_tracks(&self) -> usize;
}

/// Capture device access
///
/// Implementations:
/// - `RemoteMedia`: samples pushed by a browser client over HTTP
/// - test doubles
#[async_trait::async_trait]
pub trait MediaBackend: Send + Sync {
    /// Acquire a stream; fails with `PermissionDenied` or `DeviceUnavailable`
    async fn acquire(&self, constraints: MediaConstraints) -> ProctorResult<Arc<dyn MediaStream>>;

    /// Backend name for logging
    fn name(&self) -> &str;
}
