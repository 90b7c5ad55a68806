use std::sync::Mutex;
use tracing::debug;

use super::{SpeechCompletion, SpeechInput, SpeechOutput, TranscriptSink};
use crate::error::{ProctorError, ProctorResult};

/// Speech output performed by a remote client
///
/// The client reads `pending_text`, speaks it and reports back through
/// `complete`.
#[derive(Default)]
pub struct RemoteSpeechOutput {
    pending: Mutex<Option<(String, SpeechCompletion)>>,
}

impl RemoteSpeechOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text the client should currently be speaking
    pub fn pending_text(&self) -> Option<String> {
        self.pending
            .lock()
            .ok()
            .and_then(|p| p.as_ref().map(|(text, _)| text.clone()))
    }

    /// Client finished speaking; returns false if nothing was pending
    pub fn complete(&self) -> bool {
        let pending = self.pending.lock().ok().and_then(|mut p| p.take());
        match pending {
            Some((_, done)) => {
                done.complete();
                true
            }
            None => false,
        }
    }
}

impl SpeechOutput for RemoteSpeechOutput {
    fn speak(&self, text: &str, done: SpeechCompletion) -> ProctorResult<()> {
        let mut pending = self
            .pending
            .lock()
            .map_err(|_| ProctorError::SpeechUnavailable("speech state poisoned".to_string()))?;
        *pending = Some((text.to_string(), done));
        Ok(())
    }

    fn cancel(&self) {
        if let Ok(mut pending) = self.pending.lock() {
            if let Some((_, done)) = pending.take() {
                debug!("Cancelled utterance {}", done.utterance());
            }
        }
    }
}

/// Speech recognition performed by a remote client
#[derive(Default)]
pub struct RemoteSpeechInput {
    sink: Mutex<Option<TranscriptSink>>,
}

impl RemoteSpeechInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_listening(&self) -> bool {
        self.sink.lock().map(|s| s.is_some()).unwrap_or(false)
    }

    /// Forward a transcript; returns false if recognition is not running
    pub fn push(&self, text: &str, is_final: bool) -> bool {
        let sink = self.sink.lock().ok().and_then(|s| s.clone());
        match sink {
            Some(sink) if is_final => {
                sink.finalize(text);
                true
            }
            Some(sink) => {
                sink.interim(text);
                true
            }
            None => false,
        }
    }
}

impl SpeechInput for RemoteSpeechInput {
    fn start(&self, sink: TranscriptSink) -> ProctorResult<()> {
        let mut current = self
            .sink
            .lock()
            .map_err(|_| ProctorError::SpeechUnavailable("recognizer state poisoned".to_string()))?;
        *current = Some(sink);
        Ok(())
    }

    fn stop(&self) {
        if let Ok(mut current) = self.sink.lock() {
            current.take();
        }
    }
}
