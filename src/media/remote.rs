use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::info;

use super::backend::{MediaBackend, MediaConstraints, MediaStream};
use crate::detection::VideoFrame;
use crate::error::{ProctorError, ProctorResult};

/// Stream whose samples are pushed by a remote client
pub struct RemoteMediaStream {
    video: bool,
    audio: bool,
    video_live: AtomicBool,
    audio_live: AtomicBool,
    frame: Mutex<Option<VideoFrame>>,
    bins: Mutex<Option<Vec<u8>>>,
}

impl RemoteMediaStream {
    fn new(constraints: MediaConstraints) -> Self {
        Self {
            video: constraints.video,
            audio: constraints.audio,
            video_live: AtomicBool::new(constraints.video),
            audio_live: AtomicBool::new(constraints.audio),
            frame: Mutex::new(None),
            bins: Mutex::new(None),
        }
    }

    /// Replace the latest frame; dropped once the video track is stopped
    pub fn push_frame(&self, frame: VideoFrame) -> bool {
        if !self.video_live.load(Ordering::SeqCst) {
            return false;
        }
        if let Ok(mut slot) = self.frame.lock() {
            *slot = Some(frame);
        }
        true
    }

    /// Replace the latest frequency bins; dropped once the audio track is stopped
    pub fn push_frequency_data(&self, bins: Vec<u8>) -> bool {
        if !self.audio_live.load(Ordering::SeqCst) {
            return false;
        }
        if let Ok(mut slot) = self.bins.lock() {
            *slot = Some(bins);
        }
        true
    }
}

impl MediaStream for RemoteMediaStream {
    fn capture_frame(&self) -> Option<VideoFrame> {
        if !self.video_live.load(Ordering::SeqCst) {
            return None;
        }
        // Each pushed frame is analyzed once.
        self.frame.lock().ok().and_then(|mut f| f.take())
    }

    fn frequency_data(&self) -> Option<Vec<u8>> {
        if !self.audio_live.load(Ordering::SeqCst) {
            return None;
        }
        self.bins.lock().ok().and_then(|b| b.clone())
    }

    fn has_video(&self) -> bool {
        self.video
    }

    fn has_audio(&self) -> bool {
        self.audio
    }

    fn stop_all(&self) {
        self.video_live.store(false, Ordering::SeqCst);
        self.audio_live.store(false, Ordering::SeqCst);
        if let Ok(mut f) = self.frame.lock() {
            f.take();
        }
        if let Ok(mut b) = self.bins.lock() {
            b.take();
        }
    }

    fn live_tracks(&self) -> usize {
        self.video_live.load(Ordering::SeqCst) as usize
            + self.audio_live.load(Ordering::SeqCst) as usize
    }
}

/// Media backend for a browser client that captures locally and relays
/// samples to the server
pub struct RemoteMedia {
    /// Whether the client reported camera/microphone permission
    granted: bool,
    stream: Mutex<Option<Arc<RemoteMediaStream>>>,
}

impl RemoteMedia {
    pub fn new(granted: bool) -> Self {
        Self {
            granted,
            stream: Mutex::new(None),
        }
    }

    /// The acquired stream, for pushing samples
    pub fn stream(&self) -> Option<Arc<RemoteMediaStream>> {
        self.stream.lock().ok().and_then(|s| s.clone())
    }
}

#[async_trait::async_trait]
impl MediaBackend for RemoteMedia {
    async fn acquire(&self, constraints: MediaConstraints) -> ProctorResult<Arc<dyn MediaStream>> {
        if !self.granted {
            return Err(ProctorError::PermissionDenied(
                "camera/microphone declined by client".to_string(),
            ));
        }

        let stream = Arc::new(RemoteMediaStream::new(constraints));
        let mut slot = self
            .stream
            .lock()
            .map_err(|_| ProctorError::DeviceUnavailable("media state poisoned".to_string()))?;
        *slot = Some(Arc::clone(&stream));

        info!(
            "Remote media acquired (video={}, audio={})",
            constraints.video, constraints.audio
        );

        Ok(stream)
    }

    fn name(&self) -> &str {
        "remote"
    }
}
