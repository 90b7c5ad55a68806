use thiserror::Error;

/// Failures a proctored session recovers from without ending.
///
/// None of these abort a running session. The orchestrator degrades
/// (no video, text-only answers, skipped tick) and keeps going.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProctorError {
    /// Camera or microphone access was refused.
    #[error("permission denied for {0}")]
    PermissionDenied(String),

    /// The capture device is missing or already in use.
    #[error("capture device unavailable: {0}")]
    DeviceUnavailable(String),

    /// A frame could not be analyzed (malformed buffer, zero dimensions).
    #[error("detection failed: {0}")]
    Detection(String),

    /// No speech synthesis or recognition engine is available.
    #[error("speech engine unavailable: {0}")]
    SpeechUnavailable(String),

    /// The session already ended and no longer accepts commands.
    #[error("session {0} is closed")]
    SessionClosed(String),
}

pub type ProctorResult<T> = std::result::Result<T, ProctorError>;
