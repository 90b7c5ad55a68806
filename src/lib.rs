pub mod audio;
pub mod config;
pub mod detection;
pub mod dialogue;
pub mod error;
pub mod guard;
pub mod http;
pub mod media;
pub mod nats;
pub mod session;
pub mod speech;
pub mod tracking;

pub use audio::{AudioLevelConfig, AudioLevelMonitor, AudioNotice};
pub use config::Config;
pub use detection::{Detection, FrameAnalyzer, HeuristicFaceDetector, VideoFrame};
pub use dialogue::{ConversationTurn, DialogueController, Speaker};
pub use error::{ProctorError, ProctorResult};
pub use guard::{GuardEvent, PlatformEvents, PlatformSignal, SessionGuard};
pub use http::{create_router, AppState};
pub use media::{MediaBackend, MediaStream};
pub use nats::{NatsClient, SessionEventMessage, TranscriptMessage};
pub use session::{
    start_session, SessionCollaborators, SessionConfig, SessionEvent, SessionHandle,
    SessionResult, SessionTimer,
};
pub use speech::{SpeechInput, SpeechOutput};
pub use tracking::{FaceSample, SessionStatus, Violation, ViolationKind, ViolationTracker};
