//! Speech collaborators
//!
//! Speech output and recognition are external engines. Their callbacks are
//! delivered through `SpeechCompletion` and `TranscriptSink`, which route
//! back into the owning session's command queue.

pub mod remote;

use std::sync::Arc;

use crate::error::ProctorResult;

pub use remote::{RemoteSpeechInput, RemoteSpeechOutput};

/// One-shot "utterance finished" callback
pub struct SpeechCompletion {
    utterance: u64,
    on_complete: Box<dyn FnOnce(u64) + Send>,
}

impl SpeechCompletion {
    pub fn new(utterance: u64, on_complete: impl FnOnce(u64) + Send + 'static) -> Self {
        Self {
            utterance,
            on_complete: Box::new(on_complete),
        }
    }

    pub fn utterance(&self) -> u64 {
        self.utterance
    }

    /// Report that the utterance finished playing
    pub fn complete(self) {
        (self.on_complete)(self.utterance)
    }
}

impl std::fmt::Debug for SpeechCompletion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechCompletion")
            .field("utterance", &self.utterance)
            .finish()
    }
}

/// Receiver for recognized speech
#[derive(Clone)]
pub struct TranscriptSink {
    deliver: Arc<dyn Fn(String, bool) + Send + Sync>,
}

impl TranscriptSink {
    pub fn new(deliver: impl Fn(String, bool) + Send + Sync + 'static) -> Self {
        Self {
            deliver: Arc::new(deliver),
        }
    }

    /// In-progress hypothesis; replaces the previous one
    pub fn interim(&self, text: impl Into<String>) {
        (self.deliver)(text.into(), false)
    }

    /// Finalized transcript of one answer
    pub fn finalize(&self, text: impl Into<String>) {
        (self.deliver)(text.into(), true)
    }
}

/// Text-to-speech engine
pub trait SpeechOutput: Send + Sync {
    /// Start speaking; `done` must be completed when playback ends
    fn speak(&self, text: &str, done: SpeechCompletion) -> ProctorResult<()>;

    /// Stop any utterance immediately
    fn cancel(&self);
}

/// Speech-to-text engine
pub trait SpeechInput: Send + Sync {
    fn start(&self, sink: TranscriptSink) -> ProctorResult<()>;

    fn stop(&self);
}
